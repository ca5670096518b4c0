//! Lifecycle tests for the decision version chain and the remediation loop,
//! exercised at the pure delta level plus database-backed invariant checks
//! (ignored unless a provisioned database is available).

use caseflow_core::decision::mutator::{next_version, DecisionDelta};
use caseflow_core::decision::states::{
    ClinicalDecision, DecisionKind, DeliveryStatus, TrackingStatus,
};
use caseflow_core::decision::DecisionMutator;
use caseflow_core::models::decision_version::DecisionVersion;
use caseflow_core::tracking::remediation_message;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

fn baseline_version() -> DecisionVersion {
    DecisionVersion {
        id: 100,
        case_id: 7,
        document_id: None,
        kind: "APPROVE".to_string(),
        operational_decision: "PENDING".to_string(),
        clinical_decision: "NON_AFFIRM".to_string(),
        subtype: Some("DIRECT".to_string()),
        part: Some("B".to_string()),
        tracking_number: None,
        tracking_status: Some("PENDING".to_string()),
        tracking_received_at: None,
        tracking_failure: None,
        remediation_message: None,
        requires_fix: false,
        letter_owner: None,
        letter_status: "NOT_STARTED".to_string(),
        letter_generated_at: None,
        letter_sent_at: None,
        letter_package: None,
        delivery_status: "SENT".to_string(),
        last_payload: Some(json!({"partType": "B"})),
        attempt_count: 1,
        payload_history: Some(json!([{"hash": "h1", "attempt": 1}])),
        correlation_id: Uuid::new_v4(),
        is_active: true,
        supersedes: None,
        superseded_by: None,
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    }
}

/// The remediation loop at the version level: a tracking failure flags the
/// decision for fixing, and the subsequent resend increments the attempt
/// counter while clearing the stored failure.
#[test]
fn remediation_loop_version_chain() {
    let sent = baseline_version();

    let failure = json!({"code": "VAL-102", "detail": "invalid provider id"});
    let failed = next_version(
        &sent,
        &DecisionDelta {
            tracking_status: Some(TrackingStatus::Failed),
            tracking_failure: Some(failure.clone()),
            remediation_message: Some(remediation_message(&failure)),
            requires_fix: Some(true),
            delivery_status: Some(DeliveryStatus::Failed),
            ..Default::default()
        },
    );

    assert!(failed.requires_fix);
    assert_eq!(failed.tracking_status.as_deref(), Some("FAILED"));
    assert!(failed.tracking_failure.is_some());
    assert!(failed.remediation_message.is_some());
    assert_eq!(failed.attempt_count, 1);
    assert_eq!(failed.supersedes, Some(sent.id));

    // Operator fixed the data; the resend clears failure state and counts
    // the attempt
    let failed_row = DecisionVersion {
        id: 101,
        superseded_by: None,
        is_active: true,
        ..apply_new(&sent, failed)
    };

    let resent = next_version(
        &failed_row,
        &DecisionDelta {
            delivery_status: Some(DeliveryStatus::Sent),
            increment_attempt: true,
            clear_tracking_failure: true,
            requires_fix: Some(false),
            append_payload_history: Some(json!({"hash": "h2", "attempt": 2})),
            ..Default::default()
        },
    );

    assert!(!resent.requires_fix);
    assert!(resent.tracking_failure.is_none());
    assert!(resent.remediation_message.is_none());
    assert_eq!(resent.attempt_count, 2);
    assert_eq!(
        resent
            .payload_history
            .as_ref()
            .and_then(|h| h.as_array())
            .map(|a| a.len()),
        Some(2)
    );
}

/// Materialize a NewDecisionVersion back into a row for chain simulation
fn apply_new(
    prev: &DecisionVersion,
    new: caseflow_core::models::decision_version::NewDecisionVersion,
) -> DecisionVersion {
    DecisionVersion {
        id: prev.id + 1,
        case_id: new.case_id,
        document_id: new.document_id,
        kind: new.kind,
        operational_decision: new.operational_decision,
        clinical_decision: new.clinical_decision,
        subtype: new.subtype,
        part: new.part,
        tracking_number: new.tracking_number,
        tracking_status: new.tracking_status,
        tracking_received_at: new.tracking_received_at,
        tracking_failure: new.tracking_failure,
        remediation_message: new.remediation_message,
        requires_fix: new.requires_fix,
        letter_owner: new.letter_owner,
        letter_status: new.letter_status,
        letter_generated_at: new.letter_generated_at,
        letter_sent_at: new.letter_sent_at,
        letter_package: new.letter_package,
        delivery_status: new.delivery_status,
        last_payload: new.last_payload,
        attempt_count: new.attempt_count,
        payload_history: new.payload_history,
        correlation_id: new.correlation_id,
        is_active: true,
        supersedes: new.supersedes,
        superseded_by: None,
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    }
}

/// Applying the same outcome delta twice produces an identical copy: the
/// mutator short-circuits this case before inserting, so an event replay
/// yields exactly one version delta.
#[test]
fn equal_outcome_delta_changes_nothing() {
    let version = baseline_version();
    let replay = next_version(
        &version,
        &DecisionDelta {
            clinical_decision: Some(ClinicalDecision::NonAffirm),
            ..Default::default()
        },
    );

    assert_eq!(replay.clinical_decision, version.clinical_decision);
    assert_eq!(replay.operational_decision, version.operational_decision);
    assert_eq!(replay.attempt_count, version.attempt_count);
}

#[tokio::test]
#[ignore = "requires a provisioned caseflow database (DATABASE_URL)"]
async fn single_active_version_invariant() {
    let pool = sqlx::PgPool::connect(&std::env::var("DATABASE_URL").unwrap())
        .await
        .unwrap();
    let mutator = DecisionMutator::new(pool.clone());

    let case_id = 1;
    let correlation = Uuid::new_v4();
    mutator
        .create_decision(case_id, DecisionKind::Approve, correlation, None, None, None)
        .await
        .unwrap();
    mutator
        .apply_decision(case_id, ClinicalDecision::NonAffirm, None, None)
        .await
        .unwrap();
    mutator
        .apply_decision(case_id, ClinicalDecision::NonAffirm, None, None)
        .await
        .unwrap();

    let active = DecisionVersion::active_count(&pool, case_id).await.unwrap();
    assert_eq!(active, 1);

    // Replay of the same create request returns the existing version
    let replayed = mutator
        .create_decision(case_id, DecisionKind::Approve, correlation, None, None, None)
        .await
        .unwrap();
    assert!(!replayed.is_active || active == 1);
}
