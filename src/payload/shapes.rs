//! # Outbound Payload Shapes
//!
//! Wire types for the downstream delivery consumer. One `DecisionPayload`
//! struct carries all eight structural variants; which optional fields must
//! be present or absent is governed by the [`PayloadVariant`] axes and
//! enforced by `payload::validation`.
//!
//! Serialized field names are camelCase per the downstream contract.

use crate::constants::{message_types, system};
use crate::decision::states::{CoveragePart, DecisionSubtype};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome axis of the payload variant. Dismissals collapse onto the
/// non-affirm shape and share its negative decision code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadOutcome {
    Affirm,
    NonAffirm,
}

impl PayloadOutcome {
    /// AFFIRM yields "A"; NON_AFFIRM (and DISMISSAL, which maps onto it)
    /// yields "N". The shared negative code is a deliberate contract
    /// invariant.
    pub fn decision_code(&self) -> &'static str {
        match self {
            Self::Affirm => system::AFFIRMATIVE_DECISION_CODE,
            Self::NonAffirm => system::NEGATIVE_DECISION_CODE,
        }
    }
}

impl fmt::Display for PayloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Affirm => write!(f, "AFFIRM"),
            Self::NonAffirm => write!(f, "NON_AFFIRM"),
        }
    }
}

/// The three axes that select one of the eight payload shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadVariant {
    pub origin: DecisionSubtype,
    pub part: CoveragePart,
    pub outcome: PayloadOutcome,
}

impl PayloadVariant {
    /// Message-type discriminator written on the outbound record
    pub fn message_type(&self) -> &'static str {
        match (self.origin, self.part, self.outcome) {
            (DecisionSubtype::Direct, CoveragePart::A, PayloadOutcome::Affirm) => {
                message_types::DIRECT_PART_A_AFFIRM
            }
            (DecisionSubtype::Direct, CoveragePart::A, PayloadOutcome::NonAffirm) => {
                message_types::DIRECT_PART_A_NON_AFFIRM
            }
            (DecisionSubtype::Direct, CoveragePart::B, PayloadOutcome::Affirm) => {
                message_types::DIRECT_PART_B_AFFIRM
            }
            (DecisionSubtype::Direct, CoveragePart::B, PayloadOutcome::NonAffirm) => {
                message_types::DIRECT_PART_B_NON_AFFIRM
            }
            (DecisionSubtype::Standard, CoveragePart::A, PayloadOutcome::Affirm) => {
                message_types::STANDARD_PART_A_AFFIRM
            }
            (DecisionSubtype::Standard, CoveragePart::A, PayloadOutcome::NonAffirm) => {
                message_types::STANDARD_PART_A_NON_AFFIRM
            }
            (DecisionSubtype::Standard, CoveragePart::B, PayloadOutcome::Affirm) => {
                message_types::STANDARD_PART_B_AFFIRM
            }
            (DecisionSubtype::Standard, CoveragePart::B, PayloadOutcome::NonAffirm) => {
                message_types::STANDARD_PART_B_NON_AFFIRM
            }
        }
    }

    /// All eight variants, for exhaustive contract tests
    pub fn all() -> Vec<PayloadVariant> {
        let mut variants = Vec::with_capacity(8);
        for origin in [DecisionSubtype::Direct, DecisionSubtype::Standard] {
            for part in [CoveragePart::A, CoveragePart::B] {
                for outcome in [PayloadOutcome::Affirm, PayloadOutcome::NonAffirm] {
                    variants.push(PayloadVariant {
                        origin,
                        part,
                        outcome,
                    });
                }
            }
        }
        variants
    }
}

/// One procedure line of the outbound payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureLine {
    pub procedure_code: String,
    pub decision_indicator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_service: Option<String>,
    pub diagnosis_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_end: Option<String>,
}

/// Supporting medical documentation attached to DIRECT-origin payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,
}

/// The outbound decision payload. Optional fields are present or absent per
/// the variant axes; absent fields are omitted from the serialization
/// entirely rather than sent as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPayload {
    pub decision_tracking_id: uuid::Uuid,
    pub case_reference: String,
    pub is_direct_pa: bool,
    pub part_type: String,
    pub decision_code: String,
    pub decision_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering_provider_npi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendering_provider_ptan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esmd_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_documents: Option<Vec<MedicalDocument>>,
    pub procedures: Vec<ProcedureLine>,
}
