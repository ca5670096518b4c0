//! # Tracking-Number Handlers
//!
//! React to late-arriving acknowledgements from the upstream registration
//! authority. Success drives the case forward through tracking-received and
//! the letter chain to its terminal status; failure stores remediation state
//! and loops the case backward to validation so an operator can correct the
//! data and resubmit.
//!
//! The failure path never forwards anything to the clinical-review consumer:
//! a registration failure is a designed operator workflow state, not a
//! clinical event.

use crate::decision::mutator::{DecisionDelta, DecisionError, DecisionMutator};
use crate::decision::states::{
    ClinicalDecision, DecisionKind, DeliveryStatus, LetterStatus, OperationalDecision,
    TrackingStatus,
};
use crate::letters::client::{LetterError, LetterRenderer, LetterRequest};
use crate::models::case::Case;
use crate::models::decision_version::DecisionVersion;
use crate::status::orchestrator::{StatusError, StatusOrchestrator};
use crate::status::states::DetailedStatus;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Database error during tracking handling: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Decision mutation failed: {0}")]
    Decision(#[from] DecisionError),

    #[error("Status transition failed: {0}")]
    Status(#[from] StatusError),

    #[error("Letter generation failed: {0}")]
    Letter(#[from] LetterError),
}

pub type TrackingResult<T> = Result<T, TrackingError>;

/// Operator-facing remediation hint derived from the failure payload's error
/// code family.
pub fn remediation_message(failure: &serde_json::Value) -> String {
    let code = failure
        .get("code")
        .and_then(|value| value.as_str())
        .unwrap_or_default();

    if code.starts_with("SCHEMA") || code.starts_with("VAL") {
        "Submission data failed upstream validation. Correct the flagged fields and resubmit."
            .to_string()
    } else if code.starts_with("AUTH") {
        "Upstream authority rejected the submission credentials. Verify provider identifiers and resubmit."
            .to_string()
    } else if code.starts_with("DUP") {
        "Upstream authority reports a duplicate submission. Verify the tracking history before resubmitting."
            .to_string()
    } else {
        "Upstream registration failed. Review the stored failure detail and resubmit.".to_string()
    }
}

pub struct TrackingNumberHandler {
    pool: PgPool,
    mutator: DecisionMutator,
    status: StatusOrchestrator,
    letters: Arc<dyn LetterRenderer>,
    max_resend_attempts: i32,
}

impl TrackingNumberHandler {
    pub fn new(
        pool: PgPool,
        mutator: DecisionMutator,
        status: StatusOrchestrator,
        letters: Arc<dyn LetterRenderer>,
        max_resend_attempts: i32,
    ) -> Self {
        Self {
            pool,
            mutator,
            status,
            letters,
            max_resend_attempts,
        }
    }

    /// Success path: record the tracking value, acknowledge the delivery,
    /// move the case to tracking-received, and when the outcome is already
    /// known, run the letter chain through to the terminal status.
    #[instrument(skip(self))]
    pub async fn handle_success(
        &self,
        decision_tracking_id: Uuid,
        tracking_number: &str,
    ) -> TrackingResult<()> {
        let Some(case) = Case::find_by_tracking_id(&self.pool, decision_tracking_id).await? else {
            warn!(
                decision_tracking_id = %decision_tracking_id,
                "Tracking success for an unknown correlation key, ignoring"
            );
            return Ok(());
        };

        let Some(decision) = DecisionVersion::find_active(&self.pool, case.case_id).await? else {
            // A success can arrive for a dismissal-only case that never got a
            // decision version; treated as a no-op rather than creating a
            // placeholder
            warn!(
                case_id = case.case_id,
                decision_tracking_id = %decision_tracking_id,
                "Tracking success for a case with no decision, ignoring"
            );
            return Ok(());
        };

        let acknowledge = decision.delivery_status == DeliveryStatus::Sent.to_string();
        let decision = self
            .mutator
            .supersede_active(
                case.case_id,
                DecisionDelta {
                    tracking_number: Some(tracking_number.to_string()),
                    tracking_status: Some(TrackingStatus::Success),
                    tracking_received_at: Some(Utc::now().naive_utc()),
                    delivery_status: acknowledge.then_some(DeliveryStatus::Acknowledged),
                    ..Default::default()
                },
            )
            .await?;

        self.status
            .transition(case.case_id, DetailedStatus::TrackingReceived, None, false)
            .await?;

        info!(
            case_id = case.case_id,
            tracking_number = tracking_number,
            "Tracking number recorded"
        );

        let clinical: ClinicalDecision = decision
            .clinical_decision
            .parse()
            .unwrap_or(ClinicalDecision::Pending);
        let letter_pending = decision.letter_status == LetterStatus::NotStarted.to_string();

        if clinical.is_decided() && letter_pending {
            self.run_letter_chain(&case, &decision).await?;
        }

        Ok(())
    }

    /// Generate the decision letter and advance the case through the letter
    /// statuses to its terminal complete state.
    async fn run_letter_chain(
        &self,
        case: &Case,
        decision: &DecisionVersion,
    ) -> TrackingResult<()> {
        let request = LetterRequest {
            case_id: case.case_id,
            external_id: case.external_id.clone(),
            decision_version_id: decision.id,
            decision_kind: decision.kind.clone(),
            clinical_decision: decision.clinical_decision.clone(),
            document_id: decision.document_id,
        };

        let package = match self.letters.render(&request).await {
            Ok(package) => package,
            Err(letter_error) => {
                // The case stays at tracking-received; the next success replay
                // or an operator action retries the chain
                error!(
                    case_id = case.case_id,
                    error = %letter_error,
                    "Letter generation failed, case remains at tracking-received"
                );
                return Err(letter_error.into());
            }
        };

        self.mutator
            .supersede_active(
                case.case_id,
                DecisionDelta {
                    letter_status: Some(LetterStatus::Generated),
                    letter_generated_at: Some(package.generated_at.naive_utc()),
                    letter_package: Some(serde_json::json!({
                        "blob_url": package.blob_url,
                        "filename": package.filename,
                        "file_size_bytes": package.file_size_bytes,
                        "generated_at": package.generated_at,
                    })),
                    ..Default::default()
                },
            )
            .await?;
        self.status
            .transition(case.case_id, DetailedStatus::LetterGeneration, None, false)
            .await?;

        self.mutator
            .supersede_active(
                case.case_id,
                DecisionDelta {
                    letter_status: Some(LetterStatus::Sent),
                    letter_sent_at: Some(Utc::now().naive_utc()),
                    ..Default::default()
                },
            )
            .await?;
        self.status
            .transition(case.case_id, DetailedStatus::LetterSent, None, false)
            .await?;

        let kind: DecisionKind = decision.kind.parse().unwrap_or(DecisionKind::Approve);
        self.mutator
            .update_operational_decision(
                case.case_id,
                OperationalDecision::complete_value_for(kind),
            )
            .await?;
        self.status
            .transition(case.case_id, DetailedStatus::Complete, None, true)
            .await?;

        info!(case_id = case.case_id, "Decision letter sent, case complete");

        Ok(())
    }

    /// Failure path: store the failure payload and an operator remediation
    /// message, flag the decision for fixing, and loop the case status
    /// backward to validation. Once the resend attempt cap is reached the
    /// loop stops and the flag is left for the operator.
    #[instrument(skip(self, failure_payload))]
    pub async fn handle_failure(
        &self,
        decision_tracking_id: Uuid,
        failure_payload: serde_json::Value,
    ) -> TrackingResult<()> {
        let Some(case) = Case::find_by_tracking_id(&self.pool, decision_tracking_id).await? else {
            warn!(
                decision_tracking_id = %decision_tracking_id,
                "Tracking failure for an unknown correlation key, ignoring"
            );
            return Ok(());
        };

        let Some(decision) = DecisionVersion::find_active(&self.pool, case.case_id).await? else {
            warn!(
                case_id = case.case_id,
                "Tracking failure for a case with no decision, ignoring"
            );
            return Ok(());
        };

        let message = remediation_message(&failure_payload);

        self.mutator
            .supersede_active(
                case.case_id,
                DecisionDelta {
                    tracking_status: Some(TrackingStatus::Failed),
                    tracking_failure: Some(failure_payload),
                    remediation_message: Some(message.clone()),
                    requires_fix: Some(true),
                    delivery_status: Some(DeliveryStatus::Failed),
                    ..Default::default()
                },
            )
            .await?;

        if decision.attempt_count >= self.max_resend_attempts {
            error!(
                case_id = case.case_id,
                attempts = decision.attempt_count,
                "Resend attempt cap reached, case held for operator intervention"
            );
            return Ok(());
        }

        self.status
            .transition(
                case.case_id,
                DetailedStatus::Validation,
                Some("tracking_remediation"),
                false,
            )
            .await?;

        info!(
            case_id = case.case_id,
            remediation = %message,
            "Tracking failure recorded, case looped back for remediation"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remediation_message_by_code_family() {
        let validation = remediation_message(&json!({"code": "VAL-102"}));
        assert!(validation.contains("validation"));

        let auth = remediation_message(&json!({"code": "AUTH-9"}));
        assert!(auth.contains("credentials"));

        let duplicate = remediation_message(&json!({"code": "DUP-1"}));
        assert!(duplicate.contains("duplicate"));

        let unknown = remediation_message(&json!({"detail": "???"}));
        assert!(unknown.contains("resubmit"));
    }
}
