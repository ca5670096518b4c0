//! Contract tests for the outbound payload generator: every variant of
//! {origin} x {part} x {outcome} must pass its own shape validation, and the
//! serialized JSON must match the downstream field contract.

use caseflow_core::decision::states::{ClinicalDecision, CoveragePart, DecisionSubtype};
use caseflow_core::models::case::Case;
use caseflow_core::models::decision_version::DecisionVersion;
use caseflow_core::models::inbound_event::{InboundDocument, InboundProcedure};
use caseflow_core::payload::generator::{generate_payload, PayloadInput};
use caseflow_core::payload::shapes::PayloadOutcome;
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use uuid::Uuid;

fn case_for_part(part: CoveragePart) -> Case {
    let part_b = part == CoveragePart::B;
    Case {
        case_id: 1,
        external_id: "CF-2026-000001".to_string(),
        decision_tracking_id: Uuid::new_v4(),
        detailed_status: "clinical_review".to_string(),
        detailed_substatus: None,
        assigned_to: None,
        contact_phone: Some("(555) 867-5309".to_string()),
        state_code: part_b.then(|| "OH".to_string()),
        facility_id: (!part_b).then(|| "FAC99".to_string()),
        bill_type: (!part_b).then(|| "013".to_string()),
        rendering_provider_npi: part_b.then(|| "1234567890".to_string()),
        rendering_provider_ptan: part_b.then(|| "PT0001".to_string()),
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    }
}

fn decision_for(case: &Case, clinical: ClinicalDecision, part: CoveragePart) -> DecisionVersion {
    DecisionVersion {
        id: 1,
        case_id: case.case_id,
        document_id: None,
        kind: "APPROVE".to_string(),
        operational_decision: "PENDING".to_string(),
        clinical_decision: clinical.to_string(),
        subtype: None,
        part: Some(part.to_string()),
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
        delivery_status: "PENDING".to_string(),
        last_payload: None,
        attempt_count: 0,
        payload_history: None,
        correlation_id: Uuid::new_v4(),
        is_active: true,
        supersedes: None,
        superseded_by: None,
        created_at: Utc::now().naive_utc(),
        updated_at: Utc::now().naive_utc(),
    }
}

fn procedures() -> Vec<InboundProcedure> {
    vec![
        InboundProcedure {
            procedure_code: "97110".to_string(),
            diagnosis_codes: vec!["M54.5".to_string(), "E11-9".to_string()],
            review_code: Some("RC1".to_string()),
            program_code: Some("PG2".to_string()),
            place_of_service: Some("11".to_string()),
            service_start: NaiveDate::from_ymd_opt(2026, 7, 1),
            service_end: NaiveDate::from_ymd_opt(2026, 7, 15),
        },
        InboundProcedure {
            procedure_code: "97530".to_string(),
            diagnosis_codes: vec!["Z01.818".to_string()],
            review_code: Some("RC3".to_string()),
            program_code: Some("PG4".to_string()),
            place_of_service: Some("22".to_string()),
            service_start: NaiveDate::from_ymd_opt(2026, 7, 2),
            service_end: None,
        },
    ]
}

fn documents() -> Vec<InboundDocument> {
    vec![InboundDocument {
        document_id: Some(3),
        filename: Some("chart.pdf".to_string()),
        blob_url: Some("https://blobs.internal/chart.pdf".to_string()),
    }]
}

#[test]
fn all_eight_variants_validate_cleanly() {
    for origin in [DecisionSubtype::Direct, DecisionSubtype::Standard] {
        for part in [CoveragePart::A, CoveragePart::B] {
            for clinical in [ClinicalDecision::Affirm, ClinicalDecision::NonAffirm] {
                let case = case_for_part(part);
                let decision = decision_for(&case, clinical, part);
                let docs = documents();
                let lines = procedures();
                let esmd = match origin {
                    DecisionSubtype::Standard => Some("ESMD-20260805-001"),
                    DecisionSubtype::Direct => None,
                };

                let generated = generate_payload(&PayloadInput {
                    case: &case,
                    decision: &decision,
                    procedures: &lines,
                    documents: &docs,
                    esmd_transaction_id: esmd,
                    decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
                })
                .unwrap();

                assert!(
                    generated.violations.is_empty(),
                    "variant ({origin}, {part}, {clinical}) violated its contract: {:?}",
                    generated.violations
                );
                assert_eq!(generated.variant.origin, origin);
                assert_eq!(generated.variant.part, part);

                let expected_code = match clinical {
                    ClinicalDecision::Affirm => "A",
                    _ => "N",
                };
                assert_eq!(generated.payload.decision_code, expected_code);
            }
        }
    }
}

#[test]
fn dismissal_always_yields_negative_code() {
    for part in [CoveragePart::A, CoveragePart::B] {
        let case = case_for_part(part);
        let mut decision = decision_for(&case, ClinicalDecision::Pending, part);
        decision.kind = "DISMISSAL".to_string();
        let lines = procedures();

        let generated = generate_payload(&PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &lines,
            documents: &[],
            esmd_transaction_id: Some("ESMD-1"),
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        })
        .unwrap();

        assert_eq!(generated.payload.decision_code, "N");
        assert_eq!(generated.variant.outcome, PayloadOutcome::NonAffirm);
    }
}

/// Inbound event with indicator "N", part B, empty esMD transaction id:
/// direct PA, part B, all lines negative, documents present, no esMD id.
#[test]
fn non_affirm_part_b_direct_scenario() {
    let case = case_for_part(CoveragePart::B);
    let decision = decision_for(&case, ClinicalDecision::NonAffirm, CoveragePart::B);
    let lines = procedures();
    let docs = documents();

    let generated = generate_payload(&PayloadInput {
        case: &case,
        decision: &decision,
        procedures: &lines,
        documents: &docs,
        esmd_transaction_id: Some(""),
        decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
    })
    .unwrap();

    let json = serde_json::to_value(&generated.payload).unwrap();
    assert_eq!(json["isDirectPa"], true);
    assert_eq!(json["partType"], "B");
    assert!(json.get("esmdTransactionId").is_none());
    assert!(json["medicalDocuments"].is_array());

    for line in json["procedures"].as_array().unwrap() {
        assert_eq!(line["decisionIndicator"], "N");
    }

    // Part B wire formats: compact dates, stripped diagnosis codes
    assert_eq!(json["decisionDate"], "20260805");
    assert_eq!(json["procedures"][0]["diagnosisCodes"][0], "M545");
    assert_eq!(json["contactPhone"], "5558675309");
}

proptest! {
    /// Every generated procedure line carries the payload's decision code and
    /// no separators survive in diagnosis codes, whatever the inbound data.
    #[test]
    fn procedure_lines_always_consistent(
        codes in proptest::collection::vec("[A-Z][0-9]{2}[.\\- ]?[0-9A-Z]{0,4}", 1..5),
        procedure_code in "[0-9]{5}",
        part_b in any::<bool>(),
    ) {
        let part = if part_b { CoveragePart::B } else { CoveragePart::A };
        let case = case_for_part(part);
        let decision = decision_for(&case, ClinicalDecision::NonAffirm, part);
        let lines = vec![InboundProcedure {
            procedure_code,
            diagnosis_codes: codes,
            review_code: Some("RC1".to_string()),
            program_code: Some("PG1".to_string()),
            place_of_service: Some("11".to_string()),
            service_start: None,
            service_end: None,
        }];
        let docs = documents();

        let generated = generate_payload(&PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &lines,
            documents: &docs,
            esmd_transaction_id: None,
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        })
        .unwrap();

        prop_assert!(generated.violations.is_empty());
        for line in &generated.payload.procedures {
            prop_assert_eq!(&line.decision_indicator, "N");
            for code in &line.diagnosis_codes {
                prop_assert!(!code.contains(['.', '-', ' ']));
            }
        }
    }
}
