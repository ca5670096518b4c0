// Outbound payload layer: pure generation, shape definitions, wire
// formatting, and contract validation.

pub mod format;
pub mod generator;
pub mod shapes;
pub mod validation;

pub use generator::{
    generate_payload, resolve_variant, GeneratedPayload, PayloadError, PayloadInput, PayloadResult,
};
pub use shapes::{DecisionPayload, MedicalDocument, PayloadOutcome, PayloadVariant, ProcedureLine};
pub use validation::{validate_payload, Violation};
