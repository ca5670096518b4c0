//! # Outbound Record Model
//!
//! Append-only outbox rows handed off to the downstream delivery consumer.
//! Rows are created once per successful payload generation and never updated;
//! a resend is a new row pointing back at the attempt it replaces.
//!
//! ## Database Schema
//!
//! Maps to `caseflow_outbound_records`:
//! ```sql
//! CREATE TABLE caseflow_outbound_records (
//!   id BIGSERIAL PRIMARY KEY,
//!   message_type VARCHAR NOT NULL,
//!   decision_tracking_id UUID NOT NULL,
//!   payload JSONB NOT NULL,
//!   attempt_count INTEGER NOT NULL,
//!   payload_hash VARCHAR NOT NULL,
//!   payload_version INTEGER NOT NULL,
//!   correlation_id UUID NOT NULL,
//!   resend_of_message_id BIGINT,
//!   created_at TIMESTAMP NOT NULL
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OutboundRecord {
    pub id: i64,
    pub message_type: String,
    pub decision_tracking_id: Uuid,
    pub payload: serde_json::Value,
    pub attempt_count: i32,
    pub payload_hash: String,
    pub payload_version: i32,
    pub correlation_id: Uuid,
    pub resend_of_message_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

/// New outbound record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOutboundRecord {
    pub message_type: String,
    pub decision_tracking_id: Uuid,
    pub payload: serde_json::Value,
    pub attempt_count: i32,
    pub payload_hash: String,
    pub payload_version: i32,
    pub correlation_id: Uuid,
    pub resend_of_message_id: Option<i64>,
}

impl OutboundRecord {
    /// Append a record to the outbox
    pub async fn create(
        pool: &PgPool,
        new_record: &NewOutboundRecord,
    ) -> Result<OutboundRecord, sqlx::Error> {
        sqlx::query_as::<_, OutboundRecord>(
            "INSERT INTO caseflow_outbound_records \
             (message_type, decision_tracking_id, payload, attempt_count, \
              payload_hash, payload_version, correlation_id, resend_of_message_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             RETURNING id, message_type, decision_tracking_id, payload, attempt_count, \
                       payload_hash, payload_version, correlation_id, resend_of_message_id, \
                       created_at",
        )
        .bind(&new_record.message_type)
        .bind(new_record.decision_tracking_id)
        .bind(&new_record.payload)
        .bind(new_record.attempt_count)
        .bind(&new_record.payload_hash)
        .bind(new_record.payload_version)
        .bind(new_record.correlation_id)
        .bind(new_record.resend_of_message_id)
        .fetch_one(pool)
        .await
    }

    /// Latest outbox row for a correlation key, if any
    pub async fn find_latest_for_tracking_id(
        pool: &PgPool,
        decision_tracking_id: Uuid,
    ) -> Result<Option<OutboundRecord>, sqlx::Error> {
        sqlx::query_as::<_, OutboundRecord>(
            "SELECT id, message_type, decision_tracking_id, payload, attempt_count, \
                    payload_hash, payload_version, correlation_id, resend_of_message_id, \
                    created_at \
             FROM caseflow_outbound_records \
             WHERE decision_tracking_id = $1 \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(decision_tracking_id)
        .fetch_optional(pool)
        .await
    }
}
