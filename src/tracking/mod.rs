// Tracking-number acknowledgement handling: success advancement and the
// failure remediation loop.

pub mod handlers;

pub use handlers::{remediation_message, TrackingError, TrackingNumberHandler, TrackingResult};
