//! # Payload Generator
//!
//! Pure derivation of the outbound decision payload from a case, its active
//! decision, and the procedure/document lists carried by the inbound event.
//! No I/O happens here; the dispatcher owns persistence and delivery.
//!
//! Variant selection axes:
//! - origin: DIRECT when no esMD transaction id accompanies the request,
//!   STANDARD when one does
//! - part: the decision's coverage part
//! - outcome: the clinical decision, with DISMISSAL kinds collapsing onto
//!   the non-affirm shape
//!
//! The generated payload is validated before being returned; violations are
//! logged as warnings and enumerated for the caller, never fatal.

use crate::decision::states::{ClinicalDecision, CoveragePart, DecisionKind, DecisionSubtype};
use crate::models::case::Case;
use crate::models::decision_version::DecisionVersion;
use crate::models::inbound_event::{InboundDocument, InboundProcedure};
use crate::payload::format::{digits_only, format_wire_date, strip_code_separators};
use crate::payload::shapes::{
    DecisionPayload, MedicalDocument, PayloadOutcome, PayloadVariant, ProcedureLine,
};
use crate::payload::validation::{validate_payload, Violation};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Decision for case {case_id} has no coverage part recorded")]
    MissingCoveragePart { case_id: i64 },

    #[error("Decision for case {case_id} has no applicable outcome: {clinical}")]
    UndecidedOutcome { case_id: i64, clinical: String },

    #[error("Stored decision field is not a known value: {value}")]
    UnknownStoredValue { value: String },
}

pub type PayloadResult<T> = Result<T, PayloadError>;

/// Everything the generator needs, resolved by the caller
#[derive(Debug, Clone)]
pub struct PayloadInput<'a> {
    pub case: &'a Case,
    pub decision: &'a DecisionVersion,
    pub procedures: &'a [InboundProcedure],
    pub documents: &'a [InboundDocument],
    pub esmd_transaction_id: Option<&'a str>,
    pub decision_date: NaiveDate,
}

/// Generated payload plus its variant and any contract violations found
#[derive(Debug, Clone)]
pub struct GeneratedPayload {
    pub payload: DecisionPayload,
    pub variant: PayloadVariant,
    pub violations: Vec<Violation>,
}

/// Select the variant for a decision. DIRECT origin is inferred from the
/// absence of an esMD transaction id; dismissals take the negative shape.
pub fn resolve_variant(
    decision: &DecisionVersion,
    part: CoveragePart,
    esmd_transaction_id: Option<&str>,
) -> PayloadResult<PayloadVariant> {
    let origin = match esmd_transaction_id {
        Some(id) if !id.trim().is_empty() => DecisionSubtype::Standard,
        _ => DecisionSubtype::Direct,
    };

    let kind: DecisionKind = decision
        .kind
        .parse()
        .map_err(|_| PayloadError::UnknownStoredValue {
            value: decision.kind.clone(),
        })?;

    let outcome = if kind == DecisionKind::Dismissal {
        PayloadOutcome::NonAffirm
    } else {
        let clinical: ClinicalDecision =
            decision
                .clinical_decision
                .parse()
                .map_err(|_| PayloadError::UnknownStoredValue {
                    value: decision.clinical_decision.clone(),
                })?;
        match clinical {
            ClinicalDecision::Affirm => PayloadOutcome::Affirm,
            ClinicalDecision::NonAffirm => PayloadOutcome::NonAffirm,
            ClinicalDecision::Pending => {
                return Err(PayloadError::UndecidedOutcome {
                    case_id: decision.case_id,
                    clinical: decision.clinical_decision.clone(),
                })
            }
        }
    };

    Ok(PayloadVariant {
        origin,
        part,
        outcome,
    })
}

/// Derive the outbound payload. Pure: same input, same output.
pub fn generate_payload(input: &PayloadInput<'_>) -> PayloadResult<GeneratedPayload> {
    let part: CoveragePart = input
        .decision
        .part
        .as_deref()
        .ok_or(PayloadError::MissingCoveragePart {
            case_id: input.case.case_id,
        })?
        .parse()
        .map_err(|_| PayloadError::UnknownStoredValue {
            value: input.decision.part.clone().unwrap_or_default(),
        })?;

    let variant = resolve_variant(input.decision, part, input.esmd_transaction_id)?;
    let decision_code = variant.outcome.decision_code().to_string();

    let procedures = input
        .procedures
        .iter()
        .map(|line| ProcedureLine {
            procedure_code: line.procedure_code.clone(),
            decision_indicator: decision_code.clone(),
            review_code: line.review_code.clone(),
            program_code: line.program_code.clone(),
            place_of_service: match part {
                CoveragePart::B => line.place_of_service.clone(),
                CoveragePart::A => None,
            },
            diagnosis_codes: line
                .diagnosis_codes
                .iter()
                .map(|code| strip_code_separators(code))
                .collect(),
            service_start: line.service_start.map(|d| format_wire_date(d, part)),
            service_end: line.service_end.map(|d| format_wire_date(d, part)),
        })
        .collect();

    let medical_documents = match variant.origin {
        DecisionSubtype::Direct => Some(
            input
                .documents
                .iter()
                .map(|doc| MedicalDocument {
                    document_id: doc.document_id,
                    filename: doc.filename.clone(),
                    blob_url: doc.blob_url.clone(),
                })
                .collect(),
        ),
        DecisionSubtype::Standard => None,
    };

    let esmd_transaction_id = match variant.origin {
        DecisionSubtype::Standard => input
            .esmd_transaction_id
            .map(|id| id.trim().to_string()),
        DecisionSubtype::Direct => None,
    };

    let payload = DecisionPayload {
        decision_tracking_id: input.case.decision_tracking_id,
        case_reference: input.case.external_id.clone(),
        is_direct_pa: variant.origin == DecisionSubtype::Direct,
        part_type: part.to_string(),
        decision_code,
        decision_date: format_wire_date(input.decision_date, part),
        contact_phone: input
            .case
            .contact_phone
            .as_deref()
            .map(digits_only)
            .filter(|digits| !digits.is_empty()),
        bill_type: match part {
            CoveragePart::A => input.case.bill_type.clone(),
            CoveragePart::B => None,
        },
        facility_id: match part {
            CoveragePart::A => input.case.facility_id.clone(),
            CoveragePart::B => None,
        },
        state_code: match part {
            CoveragePart::B => input.case.state_code.clone(),
            CoveragePart::A => None,
        },
        rendering_provider_npi: match part {
            CoveragePart::B => input.case.rendering_provider_npi.clone(),
            CoveragePart::A => None,
        },
        rendering_provider_ptan: match part {
            CoveragePart::B => input.case.rendering_provider_ptan.clone(),
            CoveragePart::A => None,
        },
        esmd_transaction_id,
        medical_documents,
        procedures,
    };

    let violations = validate_payload(&payload, &variant);
    for violation in &violations {
        warn!(
            case_id = input.case.case_id,
            message_type = variant.message_type(),
            field = %violation.field,
            "Payload contract violation: {}",
            violation.message
        );
    }

    Ok(GeneratedPayload {
        payload,
        variant,
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_case(part_b: bool) -> Case {
        Case {
            case_id: 42,
            external_id: "CF-2026-000042".to_string(),
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

    fn sample_decision(case_id: i64, kind: &str, clinical: &str, part: &str) -> DecisionVersion {
        DecisionVersion {
            id: 1,
            case_id,
            document_id: None,
            kind: kind.to_string(),
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

    fn sample_procedures() -> Vec<InboundProcedure> {
        vec![InboundProcedure {
            procedure_code: "97110".to_string(),
            diagnosis_codes: vec!["M54.5".to_string()],
            review_code: Some("RC1".to_string()),
            program_code: Some("PG2".to_string()),
            place_of_service: Some("11".to_string()),
            service_start: NaiveDate::from_ymd_opt(2026, 7, 1),
            service_end: NaiveDate::from_ymd_opt(2026, 7, 15),
        }]
    }

    #[test]
    fn test_direct_part_b_non_affirm_scenario() {
        let case = sample_case(true);
        let decision = sample_decision(case.case_id, "APPROVE", "NON_AFFIRM", "B");
        let procedures = sample_procedures();
        let documents = vec![InboundDocument {
            document_id: Some(3),
            filename: Some("chart.pdf".to_string()),
            blob_url: None,
        }];

        let input = PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &procedures,
            documents: &documents,
            esmd_transaction_id: Some(""),
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        };

        let generated = generate_payload(&input).unwrap();
        assert!(generated.violations.is_empty());

        let payload = &generated.payload;
        assert!(payload.is_direct_pa);
        assert_eq!(payload.part_type, "B");
        assert_eq!(payload.decision_code, "N");
        assert!(payload.medical_documents.is_some());
        assert!(payload.esmd_transaction_id.is_none());
        assert!(payload
            .procedures
            .iter()
            .all(|line| line.decision_indicator == "N"));
        assert_eq!(payload.decision_date, "20260805");
        assert_eq!(payload.contact_phone.as_deref(), Some("5558675309"));
        assert_eq!(payload.procedures[0].diagnosis_codes[0], "M545");
    }

    #[test]
    fn test_standard_part_a_affirm() {
        let case = sample_case(false);
        let decision = sample_decision(case.case_id, "APPROVE", "AFFIRM", "A");
        let procedures = sample_procedures();

        let input = PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &procedures,
            documents: &[],
            esmd_transaction_id: Some("ESMD-789"),
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        };

        let generated = generate_payload(&input).unwrap();
        assert!(generated.violations.is_empty());

        let payload = &generated.payload;
        assert!(!payload.is_direct_pa);
        assert_eq!(payload.decision_code, "A");
        assert_eq!(payload.decision_date, "2026-08-05");
        assert_eq!(payload.esmd_transaction_id.as_deref(), Some("ESMD-789"));
        assert!(payload.medical_documents.is_none());
        assert_eq!(payload.bill_type.as_deref(), Some("013"));
        assert!(payload.state_code.is_none());
        // Part A lines never carry a place of service even when the event does
        assert!(payload.procedures[0].place_of_service.is_none());
    }

    #[test]
    fn test_dismissal_takes_negative_code() {
        let case = sample_case(true);
        let decision = sample_decision(case.case_id, "DISMISSAL", "PENDING", "B");
        let procedures = sample_procedures();

        let input = PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &procedures,
            documents: &[],
            esmd_transaction_id: Some("ESMD-1"),
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        };

        let generated = generate_payload(&input).unwrap();
        assert_eq!(generated.payload.decision_code, "N");
        assert_eq!(generated.variant.outcome, PayloadOutcome::NonAffirm);
    }

    #[test]
    fn test_pending_clinical_outcome_is_rejected() {
        let case = sample_case(true);
        let decision = sample_decision(case.case_id, "APPROVE", "PENDING", "B");

        let input = PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &[],
            documents: &[],
            esmd_transaction_id: None,
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        };

        assert!(matches!(
            generate_payload(&input),
            Err(PayloadError::UndecidedOutcome { .. })
        ));
    }

    #[test]
    fn test_missing_part_is_rejected() {
        let case = sample_case(true);
        let mut decision = sample_decision(case.case_id, "APPROVE", "AFFIRM", "B");
        decision.part = None;

        let input = PayloadInput {
            case: &case,
            decision: &decision,
            procedures: &[],
            documents: &[],
            esmd_transaction_id: None,
            decision_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
        };

        assert!(matches!(
            generate_payload(&input),
            Err(PayloadError::MissingCoveragePart { .. })
        ));
    }

    #[test]
    fn test_whitespace_esmd_is_direct() {
        let decision = sample_decision(1, "APPROVE", "AFFIRM", "B");
        let variant = resolve_variant(&decision, CoveragePart::B, Some("   ")).unwrap();
        assert_eq!(variant.origin, DecisionSubtype::Direct);

        let variant = resolve_variant(&decision, CoveragePart::B, Some("ESMD-1")).unwrap();
        assert_eq!(variant.origin, DecisionSubtype::Standard);
    }
}
