//! # Case Model
//!
//! One row per intake unit. Cases carry the correlation key shared with every
//! decision and message tied to them, the operator-facing detailed status, and
//! the provider/facility attributes the payload generator reads.
//!
//! Status columns are written only by `StatusOrchestrator::transition`; this
//! model exposes reads and the non-status attribute lookups.
//!
//! ## Database Schema
//!
//! Maps to `caseflow_cases`:
//! ```sql
//! CREATE TABLE caseflow_cases (
//!   case_id BIGSERIAL PRIMARY KEY,
//!   external_id VARCHAR NOT NULL,
//!   decision_tracking_id UUID NOT NULL UNIQUE,
//!   detailed_status VARCHAR NOT NULL,
//!   detailed_substatus VARCHAR,
//!   assigned_to VARCHAR,
//!   contact_phone VARCHAR,
//!   state_code VARCHAR,
//!   facility_id VARCHAR,
//!   bill_type VARCHAR,
//!   rendering_provider_npi VARCHAR,
//!   rendering_provider_ptan VARCHAR,
//!   created_at TIMESTAMP NOT NULL,
//!   updated_at TIMESTAMP NOT NULL
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Case {
    pub case_id: i64,
    pub external_id: String,
    pub decision_tracking_id: Uuid,
    pub detailed_status: String,
    pub detailed_substatus: Option<String>,
    pub assigned_to: Option<String>,
    pub contact_phone: Option<String>,
    pub state_code: Option<String>,
    pub facility_id: Option<String>,
    pub bill_type: Option<String>,
    pub rendering_provider_npi: Option<String>,
    pub rendering_provider_ptan: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

const CASE_COLUMNS: &str = r#"
    case_id, external_id, decision_tracking_id, detailed_status, detailed_substatus,
    assigned_to, contact_phone, state_code, facility_id, bill_type,
    rendering_provider_npi, rendering_provider_ptan, created_at, updated_at
"#;

impl Case {
    /// Find a case by primary key
    pub async fn find_by_id(pool: &PgPool, case_id: i64) -> Result<Option<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM caseflow_cases WHERE case_id = $1"
        );

        sqlx::query_as::<_, Case>(&query)
            .bind(case_id)
            .fetch_optional(pool)
            .await
    }

    /// Find a case by its correlation key
    pub async fn find_by_tracking_id(
        pool: &PgPool,
        decision_tracking_id: Uuid,
    ) -> Result<Option<Case>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM caseflow_cases WHERE decision_tracking_id = $1"
        );

        sqlx::query_as::<_, Case>(&query)
            .bind(decision_tracking_id)
            .fetch_optional(pool)
            .await
    }

    /// Parse the stored status string into the typed enum
    pub fn status(&self) -> Result<crate::status::states::DetailedStatus, String> {
        self.detailed_status.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::states::DetailedStatus;
    use chrono::Utc;

    fn sample_case() -> Case {
        Case {
            case_id: 42,
            external_id: "CF-2026-000042".to_string(),
            decision_tracking_id: Uuid::new_v4(),
            detailed_status: "tracking_pending".to_string(),
            detailed_substatus: None,
            assigned_to: Some("reviewer.a".to_string()),
            contact_phone: Some("(555) 867-5309".to_string()),
            state_code: Some("OH".to_string()),
            facility_id: None,
            bill_type: None,
            rendering_provider_npi: Some("1234567890".to_string()),
            rendering_provider_ptan: Some("PT0001".to_string()),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_status_parsing() {
        let case = sample_case();
        assert_eq!(case.status().unwrap(), DetailedStatus::TrackingPending);

        let mut bad = sample_case();
        bad.detailed_status = "nonsense".to_string();
        assert!(bad.status().is_err());
    }
}
