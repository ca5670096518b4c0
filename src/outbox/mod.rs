// Outbox layer: append-only hand-off of generated payloads to the
// downstream delivery consumer.

pub mod writer;

pub use writer::{payload_hash, OutboxError, OutboxResult, OutboxWriter};
