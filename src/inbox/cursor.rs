//! # Batch Cursor
//!
//! Tracks how far the watermark may advance after a batch. The rule: advance
//! to the maximum `(timestamp, id)` among consecutively successful events
//! counted from the front of the batch, and freeze at the first failure.
//! Events that fail are therefore retried on the next cycle, while events
//! already completed ahead of the failure are never reprocessed.

use chrono::NaiveDateTime;

/// Position of an event in the stream ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPosition {
    pub created_at: NaiveDateTime,
    pub event_id: i64,
}

#[derive(Debug, Default)]
pub struct BatchCursor {
    advance_to: Option<EventPosition>,
    frozen: bool,
}

impl BatchCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully processed event. Ignored once frozen.
    pub fn record_success(&mut self, position: EventPosition) {
        if self.frozen {
            return;
        }
        self.advance_to = Some(position);
    }

    /// Record a failed event. Freezes the cursor: later successes in the same
    /// batch no longer move the advancement target.
    pub fn record_failure(&mut self) {
        self.frozen = true;
    }

    /// The position the watermark may advance to, if any
    pub fn advance_target(&self) -> Option<EventPosition> {
        self.advance_to
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn position(second: u32, id: i64) -> EventPosition {
        let created_at: NaiveDateTime = NaiveDate::from_ymd_opt(2026, 8, 5)
            .unwrap()
            .and_hms_opt(12, 0, second)
            .unwrap();
        EventPosition {
            created_at,
            event_id: id,
        }
    }

    #[test]
    fn test_all_successes_advance_to_last() {
        let mut cursor = BatchCursor::new();
        cursor.record_success(position(1, 101));
        cursor.record_success(position(2, 102));
        cursor.record_success(position(3, 103));

        assert_eq!(cursor.advance_target(), Some(position(3, 103)));
        assert!(!cursor.is_frozen());
    }

    #[test]
    fn test_failure_freezes_at_prior_success() {
        let mut cursor = BatchCursor::new();
        cursor.record_success(position(1, 101));
        cursor.record_failure();
        cursor.record_success(position(3, 103));

        // Event 2 of 3 failed: advancement stops at event 1, events 2 and 3
        // stay eligible for the next poll
        assert_eq!(cursor.advance_target(), Some(position(1, 101)));
        assert!(cursor.is_frozen());
    }

    #[test]
    fn test_leading_failure_blocks_advancement() {
        let mut cursor = BatchCursor::new();
        cursor.record_failure();
        cursor.record_success(position(2, 102));

        assert_eq!(cursor.advance_target(), None);
    }

    #[test]
    fn test_empty_batch_has_no_target() {
        let cursor = BatchCursor::new();
        assert_eq!(cursor.advance_target(), None);
    }
}
