//! # Payload Validation
//!
//! Enumerates every contract violation in a generated payload against its
//! variant's required/forbidden field rules. Violations are warnings, not
//! errors: delivery is never blocked on cosmetic contract drift, but every
//! violation is surfaced for audit.

use crate::decision::states::{CoveragePart, DecisionSubtype};
use crate::payload::shapes::{DecisionPayload, PayloadOutcome, PayloadVariant};
use std::fmt;

/// One contract violation found in a generated payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a payload against the rules of its variant. Returns every violation
/// found; an empty vector means the payload satisfies the contract.
pub fn validate_payload(payload: &DecisionPayload, variant: &PayloadVariant) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_decision_code(payload, variant, &mut violations);
    check_part_fields(payload, variant, &mut violations);
    check_origin_fields(payload, variant, &mut violations);
    check_procedures(payload, variant, &mut violations);
    check_formats(payload, variant, &mut violations);

    violations
}

fn check_decision_code(
    payload: &DecisionPayload,
    variant: &PayloadVariant,
    violations: &mut Vec<Violation>,
) {
    let expected = variant.outcome.decision_code();
    if payload.decision_code != expected {
        violations.push(Violation::new(
            "decisionCode",
            format!(
                "expected {expected} for outcome {}, found {}",
                variant.outcome, payload.decision_code
            ),
        ));
    }
}

fn check_part_fields(
    payload: &DecisionPayload,
    variant: &PayloadVariant,
    violations: &mut Vec<Violation>,
) {
    match variant.part {
        CoveragePart::A => {
            if payload.bill_type.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new("billType", "required for Part A"));
            }
            if payload.facility_id.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new("facilityId", "required for Part A"));
            }
            if payload.state_code.is_some() {
                violations.push(Violation::new("stateCode", "must be omitted for Part A"));
            }
            if payload.rendering_provider_npi.is_some() {
                violations.push(Violation::new(
                    "renderingProviderNpi",
                    "must be omitted for Part A",
                ));
            }
            if payload.rendering_provider_ptan.is_some() {
                violations.push(Violation::new(
                    "renderingProviderPtan",
                    "must be omitted for Part A",
                ));
            }
        }
        CoveragePart::B => {
            if payload.state_code.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new("stateCode", "required for Part B"));
            }
            if payload.rendering_provider_npi.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new(
                    "renderingProviderNpi",
                    "required for Part B",
                ));
            }
            if payload.bill_type.is_some() {
                violations.push(Violation::new("billType", "must be omitted for Part B"));
            }
            if payload.facility_id.is_some() {
                violations.push(Violation::new("facilityId", "must be omitted for Part B"));
            }
        }
    }

    if payload.part_type != variant.part.to_string() {
        violations.push(Violation::new(
            "partType",
            format!(
                "expected {}, found {}",
                variant.part, payload.part_type
            ),
        ));
    }
}

fn check_origin_fields(
    payload: &DecisionPayload,
    variant: &PayloadVariant,
    violations: &mut Vec<Violation>,
) {
    match variant.origin {
        DecisionSubtype::Direct => {
            if !payload.is_direct_pa {
                violations.push(Violation::new("isDirectPa", "must be true for DIRECT origin"));
            }
            if payload.medical_documents.is_none() {
                violations.push(Violation::new(
                    "medicalDocuments",
                    "required for DIRECT origin",
                ));
            }
            if payload.esmd_transaction_id.is_some() {
                violations.push(Violation::new(
                    "esmdTransactionId",
                    "must be omitted for DIRECT origin",
                ));
            }
        }
        DecisionSubtype::Standard => {
            if payload.is_direct_pa {
                violations.push(Violation::new(
                    "isDirectPa",
                    "must be false for STANDARD origin",
                ));
            }
            if payload.esmd_transaction_id.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new(
                    "esmdTransactionId",
                    "required for STANDARD origin",
                ));
            }
            if payload.medical_documents.is_some() {
                violations.push(Violation::new(
                    "medicalDocuments",
                    "must be omitted for STANDARD origin",
                ));
            }
        }
    }
}

fn check_procedures(
    payload: &DecisionPayload,
    variant: &PayloadVariant,
    violations: &mut Vec<Violation>,
) {
    for (index, line) in payload.procedures.iter().enumerate() {
        if line.decision_indicator != payload.decision_code {
            violations.push(Violation::new(
                format!("procedures[{index}].decisionIndicator"),
                "must match the payload decision code",
            ));
        }

        if variant.outcome == PayloadOutcome::NonAffirm {
            if line.review_code.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new(
                    format!("procedures[{index}].reviewCode"),
                    "required for NON_AFFIRM outcomes",
                ));
            }
            if line.program_code.as_deref().unwrap_or("").is_empty() {
                violations.push(Violation::new(
                    format!("procedures[{index}].programCode"),
                    "required for NON_AFFIRM outcomes",
                ));
            }
        }

        match variant.part {
            CoveragePart::B => {
                if line.place_of_service.as_deref().unwrap_or("").is_empty() {
                    violations.push(Violation::new(
                        format!("procedures[{index}].placeOfService"),
                        "required for Part B lines",
                    ));
                }
            }
            CoveragePart::A => {
                if line.place_of_service.is_some() {
                    violations.push(Violation::new(
                        format!("procedures[{index}].placeOfService"),
                        "must be omitted for Part A lines",
                    ));
                }
            }
        }

        for (code_index, code) in line.diagnosis_codes.iter().enumerate() {
            if code.contains(['.', '-', '/', ' ']) {
                violations.push(Violation::new(
                    format!("procedures[{index}].diagnosisCodes[{code_index}]"),
                    "separators must be stripped",
                ));
            }
        }
    }
}

fn check_formats(
    payload: &DecisionPayload,
    variant: &PayloadVariant,
    violations: &mut Vec<Violation>,
) {
    let date_ok = match variant.part {
        CoveragePart::A => {
            payload.decision_date.len() == 10 && payload.decision_date.chars().nth(4) == Some('-')
        }
        CoveragePart::B => {
            payload.decision_date.len() == 8
                && payload.decision_date.chars().all(|c| c.is_ascii_digit())
        }
    };
    if !date_ok {
        violations.push(Violation::new(
            "decisionDate",
            match variant.part {
                CoveragePart::A => "must be formatted YYYY-MM-DD for Part A",
                CoveragePart::B => "must be formatted YYYYMMDD for Part B",
            },
        ));
    }

    if let Some(phone) = &payload.contact_phone {
        if !phone.chars().all(|c| c.is_ascii_digit()) {
            violations.push(Violation::new(
                "contactPhone",
                "must be reduced to digits only",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::shapes::ProcedureLine;
    use uuid::Uuid;

    fn base_payload(variant: &PayloadVariant) -> DecisionPayload {
        let part_b = variant.part == CoveragePart::B;
        let direct = variant.origin == DecisionSubtype::Direct;
        DecisionPayload {
            decision_tracking_id: Uuid::new_v4(),
            case_reference: "CF-1".to_string(),
            is_direct_pa: direct,
            part_type: variant.part.to_string(),
            decision_code: variant.outcome.decision_code().to_string(),
            decision_date: if part_b {
                "20260805".to_string()
            } else {
                "2026-08-05".to_string()
            },
            contact_phone: Some("5558675309".to_string()),
            bill_type: (!part_b).then(|| "013".to_string()),
            facility_id: (!part_b).then(|| "FAC99".to_string()),
            state_code: part_b.then(|| "OH".to_string()),
            rendering_provider_npi: part_b.then(|| "1234567890".to_string()),
            rendering_provider_ptan: part_b.then(|| "PT0001".to_string()),
            esmd_transaction_id: (!direct).then(|| "ESMD-123".to_string()),
            medical_documents: direct.then(Vec::new),
            procedures: vec![ProcedureLine {
                procedure_code: "97110".to_string(),
                decision_indicator: variant.outcome.decision_code().to_string(),
                review_code: Some("RC1".to_string()),
                program_code: Some("PG2".to_string()),
                place_of_service: part_b.then(|| "11".to_string()),
                diagnosis_codes: vec!["M545".to_string()],
                service_start: None,
                service_end: None,
            }],
        }
    }

    #[test]
    fn test_well_formed_payloads_have_no_violations() {
        for variant in PayloadVariant::all() {
            let payload = base_payload(&variant);
            let violations = validate_payload(&payload, &variant);
            assert!(
                violations.is_empty(),
                "variant {:?} produced violations: {:?}",
                variant,
                violations
            );
        }
    }

    #[test]
    fn test_part_a_rejects_part_b_fields() {
        let variant = PayloadVariant {
            origin: DecisionSubtype::Standard,
            part: CoveragePart::A,
            outcome: PayloadOutcome::Affirm,
        };
        let mut payload = base_payload(&variant);
        payload.state_code = Some("OH".to_string());
        payload.rendering_provider_npi = Some("1234567890".to_string());

        let violations = validate_payload(&payload, &variant);
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"stateCode"));
        assert!(fields.contains(&"renderingProviderNpi"));
    }

    #[test]
    fn test_non_affirm_lines_need_review_codes() {
        let variant = PayloadVariant {
            origin: DecisionSubtype::Direct,
            part: CoveragePart::B,
            outcome: PayloadOutcome::NonAffirm,
        };
        let mut payload = base_payload(&variant);
        payload.procedures[0].review_code = None;
        payload.procedures[0].program_code = Some(String::new());

        let violations = validate_payload(&payload, &variant);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].field.contains("reviewCode"));
        assert!(violations[1].field.contains("programCode"));
    }

    #[test]
    fn test_place_of_service_rules_by_part() {
        let variant_a = PayloadVariant {
            origin: DecisionSubtype::Standard,
            part: CoveragePart::A,
            outcome: PayloadOutcome::Affirm,
        };
        let mut payload = base_payload(&variant_a);
        payload.procedures[0].place_of_service = Some("11".to_string());
        let violations = validate_payload(&payload, &variant_a);
        assert!(violations.iter().any(|v| v.field.contains("placeOfService")));

        let variant_b = PayloadVariant {
            origin: DecisionSubtype::Standard,
            part: CoveragePart::B,
            outcome: PayloadOutcome::Affirm,
        };
        let mut payload = base_payload(&variant_b);
        payload.procedures[0].place_of_service = None;
        let violations = validate_payload(&payload, &variant_b);
        assert!(violations.iter().any(|v| v.field.contains("placeOfService")));
    }

    #[test]
    fn test_date_format_enforced_per_part() {
        let variant = PayloadVariant {
            origin: DecisionSubtype::Standard,
            part: CoveragePart::B,
            outcome: PayloadOutcome::Affirm,
        };
        let mut payload = base_payload(&variant);
        payload.decision_date = "2026-08-05".to_string();

        let violations = validate_payload(&payload, &variant);
        assert!(violations.iter().any(|v| v.field == "decisionDate"));
    }

    #[test]
    fn test_unstripped_diagnosis_code_flagged() {
        let variant = PayloadVariant {
            origin: DecisionSubtype::Direct,
            part: CoveragePart::A,
            outcome: PayloadOutcome::Affirm,
        };
        let mut payload = base_payload(&variant);
        payload.procedures[0].diagnosis_codes = vec!["M54.5".to_string()];

        let violations = validate_payload(&payload, &variant);
        assert!(violations
            .iter()
            .any(|v| v.field.contains("diagnosisCodes")));
    }
}
