//! # Inbound Event Model
//!
//! Immutable, externally-appended decision/payload events. The engine only
//! ever writes the two completion stamps (`decision_applied_at`,
//! `payload_delivered_at`); everything else belongs to the upstream producer.
//!
//! ## Claiming Contract
//!
//! Batches are claimed with `FOR UPDATE SKIP LOCKED` ordered by
//! `(created_at, event_id)` strictly after the watermark, so N concurrent
//! workers never double-claim an event and a slow worker never blocks its
//! peers.
//!
//! ## Database Schema
//!
//! Maps to `caseflow_inbound_events`:
//! ```sql
//! CREATE TABLE caseflow_inbound_events (
//!   event_id BIGSERIAL PRIMARY KEY,
//!   decision_tracking_id UUID NOT NULL,
//!   decision_indicator VARCHAR,
//!   payload JSONB,
//!   created_at TIMESTAMP NOT NULL,
//!   decision_applied_at TIMESTAMP,
//!   payload_delivered_at TIMESTAMP
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InboundEvent {
    pub event_id: i64,
    pub decision_tracking_id: Uuid,
    pub decision_indicator: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
    pub decision_applied_at: Option<NaiveDateTime>,
    pub payload_delivered_at: Option<NaiveDateTime>,
}

/// Parsed shape of the `payload` column for events that carry a generated
/// payload from the upstream extraction pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundEventPayload {
    #[serde(default)]
    pub procedures: Vec<InboundProcedure>,
    pub part_type: Option<String>,
    pub esmd_transaction_id: Option<String>,
    #[serde(default)]
    pub documentation: Vec<InboundDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundProcedure {
    pub procedure_code: String,
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
    pub review_code: Option<String>,
    pub program_code: Option<String>,
    pub place_of_service: Option<String>,
    pub service_start: Option<chrono::NaiveDate>,
    pub service_end: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundDocument {
    pub document_id: Option<i64>,
    pub filename: Option<String>,
    pub blob_url: Option<String>,
}

impl InboundEvent {
    /// Claim the next batch of events strictly after the watermark position.
    ///
    /// Must run inside the poll cycle's transaction: `FOR UPDATE SKIP LOCKED`
    /// holds the claimed rows against concurrent workers until commit.
    pub async fn claim_batch(
        conn: &mut PgConnection,
        after_timestamp: NaiveDateTime,
        after_event_id: i64,
        limit: i64,
    ) -> Result<Vec<InboundEvent>, sqlx::Error> {
        sqlx::query_as::<_, InboundEvent>(
            "SELECT event_id, decision_tracking_id, decision_indicator, payload, \
                    created_at, decision_applied_at, payload_delivered_at \
             FROM caseflow_inbound_events \
             WHERE created_at > $1 OR (created_at = $1 AND event_id > $2) \
             ORDER BY created_at ASC, event_id ASC \
             LIMIT $3 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(after_timestamp)
        .bind(after_event_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
    }

    /// Stamp the decision-applied completion flag. Idempotent: re-stamping an
    /// already-applied event leaves the original timestamp.
    pub async fn stamp_decision_applied(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE caseflow_inbound_events \
             SET decision_applied_at = COALESCE(decision_applied_at, NOW()) \
             WHERE event_id = $1",
        )
        .bind(event_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Stamp the payload-delivered completion flag, preserving any prior stamp.
    pub async fn stamp_payload_delivered(
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE caseflow_inbound_events \
             SET payload_delivered_at = COALESCE(payload_delivered_at, NOW()) \
             WHERE event_id = $1",
        )
        .bind(event_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Parse the raw payload column into its structured form
    pub fn parsed_payload(&self) -> Result<Option<InboundEventPayload>, serde_json::Error> {
        match &self.payload {
            Some(value) => serde_json::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_payload_parsing() {
        let event = InboundEvent {
            event_id: 7,
            decision_tracking_id: Uuid::new_v4(),
            decision_indicator: Some("N".to_string()),
            payload: Some(json!({
                "procedures": [
                    {
                        "procedure_code": "97110",
                        "diagnosis_codes": ["M54.5"],
                        "review_code": "RC1",
                        "program_code": "PG2",
                        "place_of_service": "11"
                    }
                ],
                "part_type": "B",
                "esmd_transaction_id": "",
                "documentation": [
                    {"document_id": 3, "filename": "chart.pdf"}
                ]
            })),
            created_at: Utc::now().naive_utc(),
            decision_applied_at: None,
            payload_delivered_at: None,
        };

        let parsed = event.parsed_payload().unwrap().unwrap();
        assert_eq!(parsed.procedures.len(), 1);
        assert_eq!(parsed.procedures[0].procedure_code, "97110");
        assert_eq!(parsed.part_type.as_deref(), Some("B"));
        assert_eq!(parsed.esmd_transaction_id.as_deref(), Some(""));
        assert_eq!(parsed.documentation.len(), 1);
    }

    #[test]
    fn test_missing_payload_is_none() {
        let event = InboundEvent {
            event_id: 8,
            decision_tracking_id: Uuid::new_v4(),
            decision_indicator: Some("A".to_string()),
            payload: None,
            created_at: Utc::now().naive_utc(),
            decision_applied_at: None,
            payload_delivered_at: None,
        };

        assert!(event.parsed_payload().unwrap().is_none());
    }
}
