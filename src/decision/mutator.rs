//! # Decision Mutator
//!
//! Creates and supersedes decision versions while holding the single-active-
//! version invariant. Every mutation follows the same shape: lock the active
//! row, copy it, apply a [`DecisionDelta`], deactivate the old row, insert the
//! new one, and link the supersession pointers — all inside one transaction,
//! so no partial write is ever observable and two concurrent writers cannot
//! both produce "the" active decision.
//!
//! Idempotency:
//! - `apply_decision` returns the active version unchanged when the requested
//!   clinical outcome already holds (safe retry of the same inbound event).
//! - `create_decision` returns the existing version on replay of the same
//!   `(correlation_id, kind)` request.
//!
//! Transient lock contention and timeouts surface to the caller as
//! `DecisionError::Database`; the batch-level retry in the inbox poller picks
//! them up on the next cycle.

use crate::decision::states::{
    ClinicalDecision, CoveragePart, DecisionKind, DecisionSubtype, DeliveryStatus, LetterStatus,
    OperationalDecision, TrackingStatus,
};
use crate::models::decision_version::{DecisionVersion, NewDecisionVersion};
use chrono::NaiveDateTime;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("No active decision for case {case_id}")]
    NoActiveDecision { case_id: i64 },

    #[error("Database error during decision mutation: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Decision serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DecisionResult<T> = Result<T, DecisionError>;

/// Field-level changes to apply on top of a copied active version.
///
/// `None` means "keep the prior value". Explicit clear flags exist for the
/// nullable fields a transition must blank out.
#[derive(Debug, Clone, Default)]
pub struct DecisionDelta {
    pub operational_decision: Option<OperationalDecision>,
    pub clinical_decision: Option<ClinicalDecision>,
    pub subtype: Option<DecisionSubtype>,
    pub part: Option<CoveragePart>,
    pub document_id: Option<i64>,
    pub tracking_number: Option<String>,
    pub tracking_status: Option<TrackingStatus>,
    pub tracking_received_at: Option<NaiveDateTime>,
    pub tracking_failure: Option<serde_json::Value>,
    pub clear_tracking_failure: bool,
    pub remediation_message: Option<String>,
    pub requires_fix: Option<bool>,
    pub letter_owner: Option<String>,
    pub letter_status: Option<LetterStatus>,
    pub letter_generated_at: Option<NaiveDateTime>,
    pub letter_sent_at: Option<NaiveDateTime>,
    pub letter_package: Option<serde_json::Value>,
    pub delivery_status: Option<DeliveryStatus>,
    pub last_payload: Option<serde_json::Value>,
    pub increment_attempt: bool,
    pub append_payload_history: Option<serde_json::Value>,
}

/// Build the replacement row: copy every field from the previous version,
/// then overlay the delta. Pure, so the copy semantics are unit-testable.
pub fn next_version(prev: &DecisionVersion, delta: &DecisionDelta) -> NewDecisionVersion {
    let mut payload_history = prev.payload_history.clone();
    if let Some(entry) = &delta.append_payload_history {
        let mut entries = match payload_history.take() {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        };
        entries.push(entry.clone());
        payload_history = Some(serde_json::Value::Array(entries));
    }

    let tracking_failure = if delta.clear_tracking_failure {
        None
    } else {
        delta
            .tracking_failure
            .clone()
            .or_else(|| prev.tracking_failure.clone())
    };

    let remediation_message = if delta.clear_tracking_failure {
        None
    } else {
        delta
            .remediation_message
            .clone()
            .or_else(|| prev.remediation_message.clone())
    };

    NewDecisionVersion {
        case_id: prev.case_id,
        document_id: delta.document_id.or(prev.document_id),
        kind: prev.kind.clone(),
        operational_decision: delta
            .operational_decision
            .map(|v| v.to_string())
            .unwrap_or_else(|| prev.operational_decision.clone()),
        clinical_decision: delta
            .clinical_decision
            .map(|v| v.to_string())
            .unwrap_or_else(|| prev.clinical_decision.clone()),
        subtype: delta
            .subtype
            .map(|v| v.to_string())
            .or_else(|| prev.subtype.clone()),
        part: delta
            .part
            .map(|v| v.to_string())
            .or_else(|| prev.part.clone()),
        tracking_number: delta
            .tracking_number
            .clone()
            .or_else(|| prev.tracking_number.clone()),
        tracking_status: delta
            .tracking_status
            .map(|v| v.to_string())
            .or_else(|| prev.tracking_status.clone()),
        tracking_received_at: delta.tracking_received_at.or(prev.tracking_received_at),
        tracking_failure,
        remediation_message,
        requires_fix: delta.requires_fix.unwrap_or(prev.requires_fix),
        letter_owner: delta
            .letter_owner
            .clone()
            .or_else(|| prev.letter_owner.clone()),
        letter_status: delta
            .letter_status
            .map(|v| v.to_string())
            .unwrap_or_else(|| prev.letter_status.clone()),
        letter_generated_at: delta.letter_generated_at.or(prev.letter_generated_at),
        letter_sent_at: delta.letter_sent_at.or(prev.letter_sent_at),
        letter_package: delta
            .letter_package
            .clone()
            .or_else(|| prev.letter_package.clone()),
        delivery_status: delta
            .delivery_status
            .map(|v| v.to_string())
            .unwrap_or_else(|| prev.delivery_status.clone()),
        last_payload: delta
            .last_payload
            .clone()
            .or_else(|| prev.last_payload.clone()),
        attempt_count: if delta.increment_attempt {
            prev.attempt_count + 1
        } else {
            prev.attempt_count
        },
        payload_history,
        correlation_id: prev.correlation_id,
        supersedes: Some(prev.id),
    }
}

/// Decision mutation component. One instance per worker, sharing the pool.
#[derive(Clone)]
pub struct DecisionMutator {
    pool: PgPool,
}

impl DecisionMutator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply a clinical outcome to a case's decision.
    ///
    /// Fetches the active version under a row lock. An already-matching
    /// outcome is returned unchanged (idempotent retry); otherwise a new
    /// version supersedes the old inside the same transaction. Creates the
    /// initial version when the case has no decision yet.
    #[instrument(skip(self))]
    pub async fn apply_decision(
        &self,
        case_id: i64,
        outcome: ClinicalDecision,
        subtype: Option<DecisionSubtype>,
        part: Option<CoveragePart>,
    ) -> DecisionResult<DecisionVersion> {
        let mut tx = self.pool.begin().await?;

        let active = DecisionVersion::lock_active(&mut tx, case_id).await?;

        let version = match active {
            Some(prev) if prev.clinical_decision == outcome.to_string() => {
                debug!(
                    case_id = case_id,
                    outcome = %outcome,
                    "Clinical outcome already applied, returning active version unchanged"
                );
                tx.commit().await?;
                return Ok(prev);
            }
            Some(prev) => {
                let delta = DecisionDelta {
                    clinical_decision: Some(outcome),
                    subtype,
                    part,
                    ..Default::default()
                };
                let new_version = next_version(&prev, &delta);
                DecisionVersion::deactivate_all(&mut tx, case_id).await?;
                let inserted = DecisionVersion::insert(&mut tx, &new_version).await?;
                DecisionVersion::link_superseded_by(&mut tx, prev.id, inserted.id).await?;
                inserted
            }
            None => {
                let new_version = NewDecisionVersion {
                    case_id,
                    document_id: None,
                    kind: DecisionKind::Approve.to_string(),
                    operational_decision: OperationalDecision::Pending.to_string(),
                    clinical_decision: outcome.to_string(),
                    subtype: subtype.map(|v| v.to_string()),
                    part: part.map(|v| v.to_string()),
                    tracking_number: None,
                    tracking_status: Some(TrackingStatus::Pending.to_string()),
                    tracking_received_at: None,
                    tracking_failure: None,
                    remediation_message: None,
                    requires_fix: false,
                    letter_owner: None,
                    letter_status: LetterStatus::NotStarted.to_string(),
                    letter_generated_at: None,
                    letter_sent_at: None,
                    letter_package: None,
                    delivery_status: DeliveryStatus::Pending.to_string(),
                    last_payload: None,
                    attempt_count: 0,
                    payload_history: None,
                    correlation_id: Uuid::new_v4(),
                    supersedes: None,
                };
                DecisionVersion::insert(&mut tx, &new_version).await?
            }
        };

        tx.commit().await?;

        info!(
            case_id = case_id,
            version_id = version.id,
            outcome = %outcome,
            "Applied clinical decision"
        );

        Ok(version)
    }

    /// Create a decision of the given kind for a case.
    ///
    /// Replay of the same `(correlation_id, kind)` request returns the
    /// existing version instead of inserting. Otherwise all currently-active
    /// versions are locked and deactivated, and the new active version is
    /// linked into the supersession chain.
    #[instrument(skip(self))]
    pub async fn create_decision(
        &self,
        case_id: i64,
        kind: DecisionKind,
        correlation_id: Uuid,
        subtype: Option<DecisionSubtype>,
        part: Option<CoveragePart>,
        document_id: Option<i64>,
    ) -> DecisionResult<DecisionVersion> {
        if let Some(existing) = DecisionVersion::find_by_correlation(
            &self.pool,
            case_id,
            correlation_id,
            &kind.to_string(),
        )
        .await?
        {
            debug!(
                case_id = case_id,
                correlation_id = %correlation_id,
                "Decision request replay detected, returning existing version"
            );
            return Ok(existing);
        }

        let mut tx = self.pool.begin().await?;

        let prior = DecisionVersion::lock_active(&mut tx, case_id).await?;
        let supersedes = prior.as_ref().map(|p| p.id);
        if prior.is_some() {
            DecisionVersion::deactivate_all(&mut tx, case_id).await?;
        }

        let operational = match kind {
            DecisionKind::Dismissal => OperationalDecision::Dismissal,
            DecisionKind::Approve => OperationalDecision::Pending,
        };

        let new_version = NewDecisionVersion {
            case_id,
            document_id,
            kind: kind.to_string(),
            operational_decision: operational.to_string(),
            clinical_decision: ClinicalDecision::Pending.to_string(),
            subtype: subtype.map(|v| v.to_string()),
            part: part.map(|v| v.to_string()),
            tracking_number: None,
            tracking_status: Some(TrackingStatus::Pending.to_string()),
            tracking_received_at: None,
            tracking_failure: None,
            remediation_message: None,
            requires_fix: false,
            letter_owner: None,
            letter_status: LetterStatus::NotStarted.to_string(),
            letter_generated_at: None,
            letter_sent_at: None,
            letter_package: None,
            delivery_status: DeliveryStatus::Pending.to_string(),
            last_payload: None,
            attempt_count: 0,
            payload_history: None,
            correlation_id,
            supersedes,
        };

        let inserted = DecisionVersion::insert(&mut tx, &new_version).await?;
        if let Some(prior_id) = supersedes {
            DecisionVersion::link_superseded_by(&mut tx, prior_id, inserted.id).await?;
        }

        tx.commit().await?;

        info!(
            case_id = case_id,
            version_id = inserted.id,
            kind = %kind,
            "Created decision version"
        );

        Ok(inserted)
    }

    /// Field-only transition on the active version: supersede-and-relink with
    /// the delta overlaid on a copy of the prior row.
    #[instrument(skip(self, delta))]
    pub async fn supersede_active(
        &self,
        case_id: i64,
        delta: DecisionDelta,
    ) -> DecisionResult<DecisionVersion> {
        let mut tx = self.pool.begin().await?;

        let prev = DecisionVersion::lock_active(&mut tx, case_id)
            .await?
            .ok_or(DecisionError::NoActiveDecision { case_id })?;

        let new_version = next_version(&prev, &delta);
        DecisionVersion::deactivate_all(&mut tx, case_id).await?;
        let inserted = DecisionVersion::insert(&mut tx, &new_version).await?;
        DecisionVersion::link_superseded_by(&mut tx, prev.id, inserted.id).await?;

        tx.commit().await?;

        debug!(
            case_id = case_id,
            prior_version_id = prev.id,
            version_id = inserted.id,
            "Superseded active decision version"
        );

        Ok(inserted)
    }

    /// Flip the operational decision, preserving every other field
    pub async fn update_operational_decision(
        &self,
        case_id: i64,
        operational: OperationalDecision,
    ) -> DecisionResult<DecisionVersion> {
        self.supersede_active(
            case_id,
            DecisionDelta {
                operational_decision: Some(operational),
                ..Default::default()
            },
        )
        .await
    }

    /// Read the active version without locking
    pub async fn active_decision(&self, case_id: i64) -> DecisionResult<Option<DecisionVersion>> {
        Ok(DecisionVersion::find_active(&self.pool, case_id).await?)
    }
}
