//! # Outbox Writer
//!
//! Appends structured, hashed, versioned records for downstream pickup. The
//! outbox is the only hand-off to the delivery consumer; nothing here calls
//! the consumer directly, so a decision transaction never spans a network
//! call.

use crate::models::outbound_record::{NewOutboundRecord, OutboundRecord};
use crate::payload::generator::GeneratedPayload;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum OutboxError {
    #[error("Resend attempt limit reached for tracking id {decision_tracking_id}: {attempts}")]
    AttemptLimitReached {
        decision_tracking_id: Uuid,
        attempts: i32,
    },

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error during outbox write: {0}")]
    Database(#[from] sqlx::Error),
}

pub type OutboxResult<T> = Result<T, OutboxError>;

/// Hex SHA-256 of the canonical payload serialization. Field order is fixed
/// by the struct definition, so equal payloads hash equal.
pub fn payload_hash(payload: &serde_json::Value) -> String {
    let canonical = payload.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{digest:x}")
}

#[derive(Clone)]
pub struct OutboxWriter {
    pool: PgPool,
    payload_version: i32,
    max_resend_attempts: i32,
}

impl OutboxWriter {
    pub fn new(pool: PgPool, payload_version: i32, max_resend_attempts: i32) -> Self {
        Self {
            pool,
            payload_version,
            max_resend_attempts,
        }
    }

    /// Append a first-send record for a freshly generated payload
    #[instrument(skip(self, generated))]
    pub async fn write(
        &self,
        decision_tracking_id: Uuid,
        correlation_id: Uuid,
        generated: &GeneratedPayload,
    ) -> OutboxResult<OutboundRecord> {
        self.append(decision_tracking_id, correlation_id, generated, 1, None)
            .await
    }

    /// Append a resend record pointing back at the attempt it replaces.
    /// Attempt counts are capped to keep a broken upstream from producing an
    /// unbounded retry stream.
    #[instrument(skip(self, generated))]
    pub async fn resend(
        &self,
        decision_tracking_id: Uuid,
        correlation_id: Uuid,
        generated: &GeneratedPayload,
        prior: &OutboundRecord,
    ) -> OutboxResult<OutboundRecord> {
        let attempt = prior.attempt_count + 1;
        if attempt > self.max_resend_attempts {
            return Err(OutboxError::AttemptLimitReached {
                decision_tracking_id,
                attempts: prior.attempt_count,
            });
        }

        self.append(
            decision_tracking_id,
            correlation_id,
            generated,
            attempt,
            Some(prior.id),
        )
        .await
    }

    async fn append(
        &self,
        decision_tracking_id: Uuid,
        correlation_id: Uuid,
        generated: &GeneratedPayload,
        attempt_count: i32,
        resend_of_message_id: Option<i64>,
    ) -> OutboxResult<OutboundRecord> {
        let payload = serde_json::to_value(&generated.payload)?;
        let hash = payload_hash(&payload);

        let record = OutboundRecord::create(
            &self.pool,
            &NewOutboundRecord {
                message_type: generated.variant.message_type().to_string(),
                decision_tracking_id,
                payload,
                attempt_count,
                payload_hash: hash.clone(),
                payload_version: self.payload_version,
                correlation_id,
                resend_of_message_id,
            },
        )
        .await?;

        info!(
            outbound_id = record.id,
            message_type = %record.message_type,
            decision_tracking_id = %decision_tracking_id,
            attempt_count = attempt_count,
            payload_hash = %hash,
            "Outbound record appended"
        );

        Ok(record)
    }

    pub fn max_resend_attempts(&self) -> i32 {
        self.max_resend_attempts
    }
}
