// Decision layer: typed decision states and the versioned mutation engine
// that owns the single-active-version invariant.

pub mod mutator;
pub mod states;

pub use mutator::{next_version, DecisionDelta, DecisionError, DecisionMutator, DecisionResult};
pub use states::{
    ClinicalDecision, CoveragePart, DecisionKind, DecisionSubtype, DeliveryStatus, LetterStatus,
    OperationalDecision, TrackingStatus,
};
