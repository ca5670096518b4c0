//! # Inbox Poller
//!
//! Background loop that claims a bounded batch of unconsumed inbound events
//! and feeds them to the dispatcher. Safe to run on every worker process
//! simultaneously: the `FOR UPDATE SKIP LOCKED` claim is the only
//! inter-worker mutual exclusion, and the durable watermark only ever moves
//! forward.
//!
//! ## Cycle Shape
//!
//! 1. Consult the resource-pressure gauge; a saturated pool shrinks the
//!    batch to 1 for this cycle rather than skipping it, so progress
//!    continues without starving other consumers of the pool.
//! 2. Open the claim transaction, read the watermark, claim the batch.
//! 3. Process events sequentially with a fixed inter-event delay. Event
//!    failures are logged and skipped; connection-class failures abort the
//!    rest of the batch.
//! 4. Advance the watermark to the last consecutively successful event and
//!    commit.
//!
//! A cancelled cycle (worker shutdown) keeps everything already committed
//! and leaves the watermark at the last durably recorded position.

use crate::config::CaseflowConfig;
use crate::inbox::cursor::{BatchCursor, EventPosition};
use crate::inbox::dispatcher::{EventDispatcher, EventOutcome, InboxError, InboxResult};
use crate::models::inbound_event::InboundEvent;
use crate::models::watermark::Watermark;
use crate::resilience::pressure::ResourcePressure;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Outcome counts for one poll cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub claimed: usize,
    pub completed: usize,
    pub rejected: usize,
    pub failed: usize,
    pub aborted: bool,
}

pub struct InboxPoller {
    pool: PgPool,
    dispatcher: EventDispatcher,
    pressure: Arc<dyn ResourcePressure>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
    inter_event_delay: Duration,
    batch_size: i64,
}

impl InboxPoller {
    pub fn new(
        pool: PgPool,
        dispatcher: EventDispatcher,
        pressure: Arc<dyn ResourcePressure>,
        config: &CaseflowConfig,
    ) -> Self {
        Self {
            pool,
            dispatcher,
            pressure,
            shutdown: Arc::new(AtomicBool::new(false)),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            inter_event_delay: Duration::from_millis(config.inter_event_delay_ms),
            batch_size: config.batch_size,
        }
    }

    /// Handle for requesting a graceful stop from another task
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run poll cycles on a fixed interval until shutdown is requested
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Inbox poller started"
        );

        loop {
            interval.tick().await;

            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            match self.poll_cycle().await {
                Ok(summary) if summary.claimed > 0 => {
                    info!(
                        claimed = summary.claimed,
                        completed = summary.completed,
                        rejected = summary.rejected,
                        failed = summary.failed,
                        aborted = summary.aborted,
                        "Poll cycle finished"
                    );
                }
                Ok(_) => debug!("Poll cycle found no eligible events"),
                Err(error) => {
                    error!(error = %error, "Poll cycle failed, resuming next interval");
                }
            }
        }

        info!("Inbox poller stopped");
    }

    /// One poll cycle: claim, dispatch sequentially, advance the watermark.
    #[instrument(skip(self))]
    pub async fn poll_cycle(&self) -> InboxResult<CycleSummary> {
        let batch_size = if self.pressure.saturated() {
            warn!("Resource pressure saturated, shrinking batch to 1 for this cycle");
            1
        } else {
            self.batch_size
        };

        let mut tx = self.pool.begin().await?;
        let watermark = Watermark::fetch(&mut tx).await?;
        let events = InboundEvent::claim_batch(
            &mut tx,
            watermark.last_seen_at,
            watermark.last_seen_event_id,
            batch_size,
        )
        .await?;

        let mut summary = CycleSummary {
            claimed: events.len(),
            ..Default::default()
        };
        let mut cursor = BatchCursor::new();

        for (index, event) in events.iter().enumerate() {
            if self.shutdown.load(Ordering::Acquire) {
                debug!(
                    remaining = events.len() - index,
                    "Shutdown requested mid-batch, committing progress so far"
                );
                break;
            }

            // Bound how long this worker holds its claim and keep downstream
            // services from seeing the whole batch at once
            if index > 0 {
                tokio::time::sleep(self.inter_event_delay).await;
            }

            let position = EventPosition {
                created_at: event.created_at,
                event_id: event.event_id,
            };

            match self.dispatcher.process_event(&mut tx, event).await {
                Ok(EventOutcome::Completed) => {
                    summary.completed += 1;
                    cursor.record_success(position);
                }
                Ok(EventOutcome::Rejected { reason }) => {
                    // Rejected events are final: left unstamped for manual
                    // inspection, but the watermark still moves past them
                    summary.rejected += 1;
                    cursor.record_success(position);
                    warn!(
                        event_id = event.event_id,
                        reason = %reason,
                        "Inbound event rejected"
                    );
                }
                Err(error) if error.is_connection_class() => {
                    summary.failed += 1;
                    summary.aborted = true;
                    cursor.record_failure();
                    error!(
                        event_id = event.event_id,
                        error = %error,
                        "Connection-class failure, aborting remainder of batch"
                    );
                    break;
                }
                Err(error) => {
                    summary.failed += 1;
                    cursor.record_failure();
                    error!(
                        event_id = event.event_id,
                        error = %error,
                        "Event processing failed, leaving for retry on next cycle"
                    );
                }
            }
        }

        if summary.aborted {
            // The session is unusable; close it defensively and let the next
            // cycle retry from the unchanged watermark
            if let Err(close_error) = tx.rollback().await {
                debug!(error = %close_error, "Swallowed error while closing aborted session");
            }
            return Ok(summary);
        }

        if let Some(target) = cursor.advance_target() {
            Watermark::advance(&mut tx, target.created_at, target.event_id).await?;
        }
        tx.commit().await?;

        Ok(summary)
    }
}
