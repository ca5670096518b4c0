pub mod case;
pub mod decision_version;
pub mod inbound_event;
pub mod outbound_record;
pub mod watermark;

// Re-export core models for easy access
pub use case::Case;
pub use decision_version::{DecisionVersion, NewDecisionVersion};
pub use inbound_event::{InboundDocument, InboundEvent, InboundEventPayload, InboundProcedure};
pub use outbound_record::{NewOutboundRecord, OutboundRecord};
pub use watermark::Watermark;
