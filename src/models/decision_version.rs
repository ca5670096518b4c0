//! # Decision Version Model
//!
//! Append-only, versioned record of a case's decision. Every change of
//! outcome, operational state, tracking result, letter progress, or delivery
//! state creates a new version superseding the previous one; the row history
//! is the audit trail.
//!
//! ## Active-Row Invariant
//!
//! At most one row per case has `is_active = true`. Creating a new version
//! atomically flips the prior active row inactive and links the supersession
//! chain in both directions. The deactivate-and-insert pair always runs inside
//! one transaction with the prior row locked, so two concurrent writers can
//! never both believe they hold the active decision.
//!
//! ## Database Schema
//!
//! Maps to `caseflow_decision_versions`:
//! ```sql
//! CREATE TABLE caseflow_decision_versions (
//!   id BIGSERIAL PRIMARY KEY,
//!   case_id BIGINT NOT NULL,
//!   document_id BIGINT,
//!   kind VARCHAR NOT NULL,
//!   operational_decision VARCHAR NOT NULL,
//!   clinical_decision VARCHAR NOT NULL,
//!   subtype VARCHAR,
//!   part VARCHAR,
//!   tracking_number VARCHAR,
//!   tracking_status VARCHAR,
//!   tracking_received_at TIMESTAMP,
//!   tracking_failure JSONB,
//!   remediation_message VARCHAR,
//!   requires_fix BOOLEAN NOT NULL DEFAULT false,
//!   letter_owner VARCHAR,
//!   letter_status VARCHAR NOT NULL,
//!   letter_generated_at TIMESTAMP,
//!   letter_sent_at TIMESTAMP,
//!   letter_package JSONB,
//!   delivery_status VARCHAR NOT NULL,
//!   last_payload JSONB,
//!   attempt_count INTEGER NOT NULL DEFAULT 0,
//!   payload_history JSONB,
//!   correlation_id UUID NOT NULL,
//!   is_active BOOLEAN NOT NULL DEFAULT true,
//!   supersedes BIGINT,
//!   superseded_by BIGINT,
//!   created_at TIMESTAMP NOT NULL,
//!   updated_at TIMESTAMP NOT NULL
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DecisionVersion {
    pub id: i64,
    pub case_id: i64,
    pub document_id: Option<i64>,
    pub kind: String,
    pub operational_decision: String,
    pub clinical_decision: String,
    pub subtype: Option<String>,
    pub part: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_status: Option<String>,
    pub tracking_received_at: Option<NaiveDateTime>,
    pub tracking_failure: Option<serde_json::Value>,
    pub remediation_message: Option<String>,
    pub requires_fix: bool,
    pub letter_owner: Option<String>,
    pub letter_status: String,
    pub letter_generated_at: Option<NaiveDateTime>,
    pub letter_sent_at: Option<NaiveDateTime>,
    pub letter_package: Option<serde_json::Value>,
    pub delivery_status: String,
    pub last_payload: Option<serde_json::Value>,
    pub attempt_count: i32,
    pub payload_history: Option<serde_json::Value>,
    pub correlation_id: Uuid,
    pub is_active: bool,
    pub supersedes: Option<i64>,
    pub superseded_by: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// New decision version for insertion. All fields mirror the row; `id` and
/// timestamps are assigned by the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDecisionVersion {
    pub case_id: i64,
    pub document_id: Option<i64>,
    pub kind: String,
    pub operational_decision: String,
    pub clinical_decision: String,
    pub subtype: Option<String>,
    pub part: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_status: Option<String>,
    pub tracking_received_at: Option<NaiveDateTime>,
    pub tracking_failure: Option<serde_json::Value>,
    pub remediation_message: Option<String>,
    pub requires_fix: bool,
    pub letter_owner: Option<String>,
    pub letter_status: String,
    pub letter_generated_at: Option<NaiveDateTime>,
    pub letter_sent_at: Option<NaiveDateTime>,
    pub letter_package: Option<serde_json::Value>,
    pub delivery_status: String,
    pub last_payload: Option<serde_json::Value>,
    pub attempt_count: i32,
    pub payload_history: Option<serde_json::Value>,
    pub correlation_id: Uuid,
    pub supersedes: Option<i64>,
}

const VERSION_COLUMNS: &str = r#"
    id, case_id, document_id, kind, operational_decision, clinical_decision,
    subtype, part, tracking_number, tracking_status, tracking_received_at,
    tracking_failure, remediation_message, requires_fix, letter_owner,
    letter_status, letter_generated_at, letter_sent_at, letter_package,
    delivery_status, last_payload, attempt_count, payload_history,
    correlation_id, is_active, supersedes, superseded_by, created_at, updated_at
"#;

impl DecisionVersion {
    /// Find the active version for a case without locking (read path)
    pub async fn find_active(
        pool: &PgPool,
        case_id: i64,
    ) -> Result<Option<DecisionVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM caseflow_decision_versions \
             WHERE case_id = $1 AND is_active = true"
        );

        sqlx::query_as::<_, DecisionVersion>(&query)
            .bind(case_id)
            .fetch_optional(pool)
            .await
    }

    /// Find and lock the active version for a case. Must run inside the
    /// transaction that will supersede it.
    pub async fn lock_active(
        conn: &mut PgConnection,
        case_id: i64,
    ) -> Result<Option<DecisionVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM caseflow_decision_versions \
             WHERE case_id = $1 AND is_active = true FOR UPDATE"
        );

        sqlx::query_as::<_, DecisionVersion>(&query)
            .bind(case_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Idempotency lookup for request replay: an existing version with the
    /// same correlation id and kind means the request was already applied.
    pub async fn find_by_correlation(
        pool: &PgPool,
        case_id: i64,
        correlation_id: Uuid,
        kind: &str,
    ) -> Result<Option<DecisionVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM caseflow_decision_versions \
             WHERE case_id = $1 AND correlation_id = $2 AND kind = $3 \
             ORDER BY id DESC LIMIT 1"
        );

        sqlx::query_as::<_, DecisionVersion>(&query)
            .bind(case_id)
            .bind(correlation_id)
            .bind(kind)
            .fetch_optional(pool)
            .await
    }

    /// Full supersession chain for a case, oldest first
    pub async fn history(
        pool: &PgPool,
        case_id: i64,
    ) -> Result<Vec<DecisionVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM caseflow_decision_versions \
             WHERE case_id = $1 ORDER BY id ASC"
        );

        sqlx::query_as::<_, DecisionVersion>(&query)
            .bind(case_id)
            .fetch_all(pool)
            .await
    }

    /// Deactivate every active version for a case. Runs inside the caller's
    /// transaction; the rows must already be locked.
    pub async fn deactivate_all(
        conn: &mut PgConnection,
        case_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE caseflow_decision_versions \
             SET is_active = false, updated_at = NOW() \
             WHERE case_id = $1 AND is_active = true",
        )
        .bind(case_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Insert a new active version. Runs inside the caller's transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        new_version: &NewDecisionVersion,
    ) -> Result<DecisionVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO caseflow_decision_versions \
             (case_id, document_id, kind, operational_decision, clinical_decision, \
              subtype, part, tracking_number, tracking_status, tracking_received_at, \
              tracking_failure, remediation_message, requires_fix, letter_owner, \
              letter_status, letter_generated_at, letter_sent_at, letter_package, \
              delivery_status, last_payload, attempt_count, payload_history, \
              correlation_id, is_active, supersedes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18, $19, $20, $21, $22, $23, true, $24, NOW(), NOW()) \
             RETURNING {VERSION_COLUMNS}"
        );

        sqlx::query_as::<_, DecisionVersion>(&query)
            .bind(new_version.case_id)
            .bind(new_version.document_id)
            .bind(&new_version.kind)
            .bind(&new_version.operational_decision)
            .bind(&new_version.clinical_decision)
            .bind(&new_version.subtype)
            .bind(&new_version.part)
            .bind(&new_version.tracking_number)
            .bind(&new_version.tracking_status)
            .bind(new_version.tracking_received_at)
            .bind(&new_version.tracking_failure)
            .bind(&new_version.remediation_message)
            .bind(new_version.requires_fix)
            .bind(&new_version.letter_owner)
            .bind(&new_version.letter_status)
            .bind(new_version.letter_generated_at)
            .bind(new_version.letter_sent_at)
            .bind(&new_version.letter_package)
            .bind(&new_version.delivery_status)
            .bind(&new_version.last_payload)
            .bind(new_version.attempt_count)
            .bind(&new_version.payload_history)
            .bind(new_version.correlation_id)
            .bind(new_version.supersedes)
            .fetch_one(&mut *conn)
            .await
    }

    /// Point the superseded row forward at its replacement. Runs inside the
    /// caller's transaction.
    pub async fn link_superseded_by(
        conn: &mut PgConnection,
        old_id: i64,
        new_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE caseflow_decision_versions \
             SET superseded_by = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(old_id)
        .bind(new_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Count of active versions for a case. Used by invariant checks in tests.
    pub async fn active_count(pool: &PgPool, case_id: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM caseflow_decision_versions \
             WHERE case_id = $1 AND is_active = true",
        )
        .bind(case_id)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }
}
