//! # Event Dispatcher
//!
//! Applies one claimed inbound event: decision application first, then —
//! independently — payload derivation and the outbox write. Each path is
//! individually idempotent via the event's completion stamps and the
//! mutator's own replay checks, so reprocessing an event after a crash
//! produces no duplicate writes.
//!
//! The decision and payload transactions commit on the pool while the event
//! row stays locked in the poller's claim transaction. If the claim
//! transaction later rolls back, the stamps are lost but the mutations
//! stand; the retried event then no-ops through the idempotent paths.

use crate::decision::mutator::{DecisionDelta, DecisionError, DecisionMutator};
use crate::decision::states::{ClinicalDecision, CoveragePart, DecisionSubtype, DeliveryStatus};
use crate::models::case::Case;
use crate::models::decision_version::DecisionVersion;
use crate::models::inbound_event::{InboundEvent, InboundEventPayload};
use crate::models::outbound_record::OutboundRecord;
use crate::outbox::writer::{OutboxError, OutboxWriter};
use crate::payload::generator::{generate_payload, PayloadInput};
use crate::status::orchestrator::{StatusError, StatusOrchestrator};
use crate::status::states::DetailedStatus;
use chrono::Utc;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Error, Debug)]
pub enum InboxError {
    #[error("Database error during inbox processing: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Decision mutation failed: {0}")]
    Decision(#[from] DecisionError),

    #[error("Outbox write failed: {0}")]
    Outbox(#[from] OutboxError),

    #[error("Status transition failed: {0}")]
    Status(#[from] StatusError),
}

impl InboxError {
    /// Connection-class failures make the session unusable; the poller aborts
    /// the remainder of the batch when it sees one.
    pub fn is_connection_class(&self) -> bool {
        let sqlx_error = match self {
            InboxError::Database(e) => Some(e),
            InboxError::Decision(DecisionError::Database(e)) => Some(e),
            InboxError::Outbox(OutboxError::Database(e)) => Some(e),
            InboxError::Status(StatusError::Database(e)) => Some(e),
            _ => None,
        };

        matches!(
            sqlx_error,
            Some(
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::Protocol(_)
            )
        )
    }
}

pub type InboxResult<T> = Result<T, InboxError>;

/// How a single event ended. Rejections (malformed events) are final: they
/// are logged, left unstamped for manual inspection, and the watermark still
/// moves past them so they are not re-logged forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Completed,
    Rejected { reason: String },
}

#[derive(Clone)]
pub struct EventDispatcher {
    pool: PgPool,
    mutator: DecisionMutator,
    outbox: OutboxWriter,
    status: StatusOrchestrator,
}

impl EventDispatcher {
    pub fn new(
        pool: PgPool,
        mutator: DecisionMutator,
        outbox: OutboxWriter,
        status: StatusOrchestrator,
    ) -> Self {
        Self {
            pool,
            mutator,
            outbox,
            status,
        }
    }

    /// Process one claimed event. `conn` is the poller's claim transaction,
    /// used only for the completion stamps on the locked event row.
    #[instrument(skip(self, conn, event), fields(event_id = event.event_id))]
    pub async fn process_event(
        &self,
        conn: &mut PgConnection,
        event: &InboundEvent,
    ) -> InboxResult<EventOutcome> {
        let indicator = match event.decision_indicator.as_deref() {
            Some(value) if !value.is_empty() => value,
            _ => {
                warn!(
                    event_id = event.event_id,
                    decision_tracking_id = %event.decision_tracking_id,
                    "Inbound event carries no decision indicator, leaving for manual inspection"
                );
                return Ok(EventOutcome::Rejected {
                    reason: "missing decision indicator".to_string(),
                });
            }
        };

        let outcome = match indicator {
            "A" => ClinicalDecision::Affirm,
            "N" => ClinicalDecision::NonAffirm,
            other => {
                warn!(
                    event_id = event.event_id,
                    indicator = other,
                    "Inbound event carries an unknown decision indicator"
                );
                return Ok(EventOutcome::Rejected {
                    reason: format!("unknown decision indicator: {other}"),
                });
            }
        };

        let case = match Case::find_by_tracking_id(&self.pool, event.decision_tracking_id).await? {
            Some(case) => case,
            None => {
                warn!(
                    event_id = event.event_id,
                    decision_tracking_id = %event.decision_tracking_id,
                    "No case matches the inbound event's correlation key"
                );
                return Ok(EventOutcome::Rejected {
                    reason: "unknown correlation key".to_string(),
                });
            }
        };

        let parsed_payload = match event.parsed_payload() {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    event_id = event.event_id,
                    error = %error,
                    "Inbound event payload is not parseable"
                );
                return Ok(EventOutcome::Rejected {
                    reason: format!("unparseable payload: {error}"),
                });
            }
        };

        self.apply_decision_path(conn, event, &case, outcome, parsed_payload.as_ref())
            .await?;

        if let Some(payload) = &parsed_payload {
            match self.payload_path(conn, event, &case, payload).await? {
                EventOutcome::Completed => {}
                rejected => return Ok(rejected),
            }
        }

        Ok(EventOutcome::Completed)
    }

    /// Decision application: idempotent via the completion stamp and the
    /// mutator's equal-outcome check.
    async fn apply_decision_path(
        &self,
        conn: &mut PgConnection,
        event: &InboundEvent,
        case: &Case,
        outcome: ClinicalDecision,
        parsed_payload: Option<&InboundEventPayload>,
    ) -> InboxResult<()> {
        if event.decision_applied_at.is_some() {
            debug!(
                event_id = event.event_id,
                "Decision already applied for event, skipping"
            );
            return Ok(());
        }

        let subtype = parsed_payload.map(|payload| {
            match payload.esmd_transaction_id.as_deref() {
                Some(id) if !id.trim().is_empty() => DecisionSubtype::Standard,
                _ => DecisionSubtype::Direct,
            }
        });

        let part = parsed_payload
            .and_then(|payload| payload.part_type.as_deref())
            .and_then(|value| value.parse::<CoveragePart>().ok());

        self.mutator
            .apply_decision(case.case_id, outcome, subtype, part)
            .await?;

        InboundEvent::stamp_decision_applied(conn, event.event_id).await?;

        Ok(())
    }

    /// Payload derivation and outbox write: idempotent via the delivery
    /// stamp. A prior outbound record marks this send as a remediation
    /// resend, which increments the attempt counter and clears the stored
    /// failure state.
    async fn payload_path(
        &self,
        conn: &mut PgConnection,
        event: &InboundEvent,
        case: &Case,
        payload: &InboundEventPayload,
    ) -> InboxResult<EventOutcome> {
        if event.payload_delivered_at.is_some() {
            debug!(
                event_id = event.event_id,
                "Payload already delivered for event, skipping"
            );
            return Ok(EventOutcome::Completed);
        }

        let decision = match DecisionVersion::find_active(&self.pool, case.case_id).await? {
            Some(decision) => decision,
            None => {
                warn!(
                    event_id = event.event_id,
                    case_id = case.case_id,
                    "No active decision available for payload derivation"
                );
                return Ok(EventOutcome::Rejected {
                    reason: "no active decision".to_string(),
                });
            }
        };

        let input = PayloadInput {
            case,
            decision: &decision,
            procedures: &payload.procedures,
            documents: &payload.documentation,
            esmd_transaction_id: payload.esmd_transaction_id.as_deref(),
            decision_date: Utc::now().date_naive(),
        };

        let generated = match generate_payload(&input) {
            Ok(generated) => generated,
            Err(error) => {
                warn!(
                    event_id = event.event_id,
                    case_id = case.case_id,
                    error = %error,
                    "Payload cannot be derived from the stored decision"
                );
                return Ok(EventOutcome::Rejected {
                    reason: error.to_string(),
                });
            }
        };

        let prior = OutboundRecord::find_latest_for_tracking_id(
            &self.pool,
            case.decision_tracking_id,
        )
        .await?;

        let send_result = match &prior {
            Some(prior_record) => {
                self.outbox
                    .resend(
                        case.decision_tracking_id,
                        decision.correlation_id,
                        &generated,
                        prior_record,
                    )
                    .await
            }
            None => {
                self.outbox
                    .write(case.decision_tracking_id, decision.correlation_id, &generated)
                    .await
            }
        };

        let record = match send_result {
            Ok(record) => record,
            Err(OutboxError::AttemptLimitReached {
                decision_tracking_id,
                attempts,
            }) => {
                // Retrying every cycle cannot succeed; hold the event for the
                // operator instead of pinning the watermark on it
                warn!(
                    event_id = event.event_id,
                    decision_tracking_id = %decision_tracking_id,
                    attempts = attempts,
                    "Resend attempt limit reached, leaving event for operator review"
                );
                return Ok(EventOutcome::Rejected {
                    reason: "resend attempt limit reached".to_string(),
                });
            }
            Err(error) => return Err(error.into()),
        };

        let resend = prior.is_some();
        self.mutator
            .supersede_active(
                case.case_id,
                DecisionDelta {
                    delivery_status: Some(DeliveryStatus::Sent),
                    last_payload: Some(record.payload.clone()),
                    increment_attempt: true,
                    clear_tracking_failure: resend,
                    requires_fix: resend.then_some(false),
                    append_payload_history: Some(json!({
                        "hash": record.payload_hash,
                        "attempt": record.attempt_count,
                        "message_type": record.message_type,
                    })),
                    ..Default::default()
                },
            )
            .await?;

        InboundEvent::stamp_payload_delivered(conn, event.event_id).await?;

        match self
            .status
            .transition(case.case_id, DetailedStatus::TrackingPending, None, false)
            .await
        {
            Ok(()) => {}
            Err(StatusError::InvalidTransition { from, .. }) => {
                // The case may already be past validation (late replay);
                // the payload still went out, so the event is complete
                warn!(
                    case_id = case.case_id,
                    from = %from,
                    "Case not in a payload-sending status, leaving status unchanged"
                );
            }
            Err(error) => return Err(error.into()),
        }

        info!(
            event_id = event.event_id,
            case_id = case.case_id,
            outbound_id = record.id,
            resend = resend,
            "Payload derived and handed to the outbox"
        );

        Ok(EventOutcome::Completed)
    }
}
