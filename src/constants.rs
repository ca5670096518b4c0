//! # System Constants
//!
//! Core constants, status groupings, and message-type discriminators that
//! define the operational boundaries of the decision workflow engine.

// Re-export status and decision types for convenience
pub use crate::decision::states::{
    ClinicalDecision, CoveragePart, DecisionKind, DecisionSubtype, DeliveryStatus, LetterStatus,
    OperationalDecision, TrackingStatus,
};
pub use crate::status::states::DetailedStatus;

/// Outbound message-type discriminators, one per payload variant
pub mod message_types {
    pub const DIRECT_PART_A_AFFIRM: &str = "decision.direct.part_a.affirm";
    pub const DIRECT_PART_A_NON_AFFIRM: &str = "decision.direct.part_a.non_affirm";
    pub const DIRECT_PART_B_AFFIRM: &str = "decision.direct.part_b.affirm";
    pub const DIRECT_PART_B_NON_AFFIRM: &str = "decision.direct.part_b.non_affirm";
    pub const STANDARD_PART_A_AFFIRM: &str = "decision.standard.part_a.affirm";
    pub const STANDARD_PART_A_NON_AFFIRM: &str = "decision.standard.part_a.non_affirm";
    pub const STANDARD_PART_B_AFFIRM: &str = "decision.standard.part_b.affirm";
    pub const STANDARD_PART_B_NON_AFFIRM: &str = "decision.standard.part_b.non_affirm";
}

/// Status groupings for operator queries and dashboards
pub mod status_groups {
    use crate::status::states::DetailedStatus;

    /// Statuses from which no further transition is allowed
    pub const TERMINAL: &[DetailedStatus] = &[DetailedStatus::Complete, DetailedStatus::Dismissed];

    /// Statuses where the engine is waiting on an external acknowledgement
    pub const AWAITING_EXTERNAL: &[DetailedStatus] = &[
        DetailedStatus::TrackingPending,
        DetailedStatus::LetterGeneration,
        DetailedStatus::LetterSent,
    ];

    /// Statuses where an operator owns the next action
    pub const OPERATOR_OWNED: &[DetailedStatus] =
        &[DetailedStatus::Intake, DetailedStatus::Validation];
}

/// System-level constants
pub mod system {
    /// Version stamped on every outbound payload
    pub const PAYLOAD_VERSION: i32 = 2;

    /// Schema version this build requires at startup
    pub const REQUIRED_SCHEMA_VERSION: i32 = 4;

    /// Decision code shared by NON_AFFIRM and DISMISSAL outcomes
    pub const NEGATIVE_DECISION_CODE: &str = "N";

    /// Decision code for AFFIRM outcomes
    pub const AFFIRMATIVE_DECISION_CODE: &str = "A";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_groups_disjoint() {
        for status in status_groups::TERMINAL {
            assert!(!status_groups::AWAITING_EXTERNAL.contains(status));
            assert!(!status_groups::OPERATOR_OWNED.contains(status));
        }
    }

    #[test]
    fn test_decision_codes() {
        assert_ne!(
            system::NEGATIVE_DECISION_CODE,
            system::AFFIRMATIVE_DECISION_CODE
        );
    }
}
