// Inbox layer: watermark-based polling of externally-written decision
// events, batch claiming under row locks, and per-event dispatch.

pub mod cursor;
pub mod dispatcher;
pub mod poller;

pub use cursor::{BatchCursor, EventPosition};
pub use dispatcher::{EventDispatcher, EventOutcome, InboxError, InboxResult};
pub use poller::{CycleSummary, InboxPoller};
