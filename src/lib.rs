#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Caseflow Core
//!
//! Rust implementation of the decision-workflow core of a case-processing
//! backend: ingesting externally-produced decision events, applying them
//! exactly-once-in-effect to versioned decision records, deriving validated
//! outbound payloads, and tracking downstream delivery through a multi-stage
//! status machine.
//!
//! ## Architecture
//!
//! The engine is built around an inbox/outbox pair over PostgreSQL:
//!
//! - The **inbox poller** claims bounded batches of unconsumed events with
//!   `FOR UPDATE SKIP LOCKED`, processes them sequentially, and advances a
//!   durable watermark that never passes a failed event.
//! - The **decision mutator** owns the versioned decision record: every
//!   change supersedes the active version inside one locked transaction, so
//!   at most one version per case is ever active and the full chain is an
//!   audit trail.
//! - The **payload generator** is a pure function selecting among eight
//!   schema-validated outbound shapes; violations are enumerated and logged,
//!   never fatal.
//! - The **outbox writer** appends hashed, versioned records for the
//!   downstream delivery consumer.
//! - The **tracking handlers** react to external acknowledgements: success
//!   drives the case through the letter chain to completion, failure stores
//!   remediation state and loops the case back to validation.
//!
//! ## Concurrency Model
//!
//! Multiple worker processes run the same poll loop on independent timers.
//! Cross-process safety comes entirely from row locks: the skip-locked batch
//! claim between workers, and the per-case active-version lock inside the
//! mutator. Decision row locks never span an external network call.
//!
//! ## Module Organization
//!
//! - [`models`] - sqlx-backed persistence models
//! - [`decision`] - decision states and the versioned mutation engine
//! - [`status`] - detailed-status state machine and its single writer
//! - [`payload`] - pure payload generation and contract validation
//! - [`inbox`] - poller, batch cursor, and event dispatcher
//! - [`outbox`] - append-only hand-off to the delivery consumer
//! - [`tracking`] - tracking-number success/failure handling
//! - [`letters`] - letter-rendering collaborator client
//! - [`resilience`] - resource-pressure gauge for poller backpressure
//! - [`database`] - pool bootstrap and the startup schema gate
//! - [`config`] - configuration management
//! - [`error`] - structured error handling

pub mod config;
pub mod constants;
pub mod database;
pub mod decision;
pub mod error;
pub mod inbox;
pub mod letters;
pub mod logging;
pub mod models;
pub mod outbox;
pub mod payload;
pub mod resilience;
pub mod status;
pub mod tracking;

pub use config::CaseflowConfig;
pub use constants::{
    message_types, status_groups, system, ClinicalDecision, CoveragePart, DecisionKind,
    DecisionSubtype, DeliveryStatus, DetailedStatus, LetterStatus, OperationalDecision,
    TrackingStatus,
};
pub use decision::{DecisionDelta, DecisionError, DecisionMutator};
pub use error::{CaseflowError, Result};
pub use inbox::{BatchCursor, CycleSummary, EventDispatcher, InboxError, InboxPoller};
pub use outbox::OutboxWriter;
pub use payload::{generate_payload, DecisionPayload, PayloadInput, PayloadVariant};
pub use status::{StatusError, StatusOrchestrator};
pub use tracking::TrackingNumberHandler;
