use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, info_span, warn};

use coffeeclub_events::EventCursor;

use crate::chain::{ChainClient, ChainError, SortOrder};
use crate::projections::{EventCursorStore, HandlerError};
use crate::read_model::StoreError;

use super::tracker::EventTracker;

/// Timing knobs shared by all trackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay after a successful poll with no further pages.
    pub polling_interval: Duration,
    /// Delay after any failed iteration.
    pub error_retry_interval: Duration,
    /// Maximum events requested per page.
    pub page_limit: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_millis(crate::config::DEFAULT_POLLING_INTERVAL_MS),
            error_retry_interval: Duration::from_millis(
                crate::config::DEFAULT_ERROR_RETRY_INTERVAL_MS,
            ),
            page_limit: crate::config::DEFAULT_QUERY_PAGE_LIMIT,
        }
    }
}

/// Why a poll iteration failed. The retry policy is the same for every
/// variant; [`PollError::is_transient`] only feeds logging.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("event query failed: {0}")]
    Query(#[from] ChainError),
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
    #[error("cursor persistence failed: {0}")]
    Cursor(#[from] StoreError),
}

impl PollError {
    pub fn is_transient(&self) -> bool {
        match self {
            PollError::Query(e) => e.is_transient(),
            PollError::Handler(e) => e.is_transient(),
            PollError::Cursor(_) => false,
        }
    }
}

/// Result of one successful iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub events: usize,
    pub has_next_page: bool,
    /// Cursor persisted by this iteration, if it advanced.
    pub advanced_to: Option<EventCursor>,
}

/// Drives one tracker's event stream: query, handle, persist cursor, repeat.
///
/// The in-memory cursor only moves after the batch was handled *and* the new
/// cursor was persisted; any failure leaves it untouched so the next
/// iteration re-queries the same page.
pub struct EventPoller {
    tracker: EventTracker,
    chain: Arc<dyn ChainClient>,
    cursors: Arc<dyn EventCursorStore>,
    config: PollerConfig,
    cursor: Option<EventCursor>,
}

impl EventPoller {
    /// Load the tracker's last persisted cursor; absent means start of stream.
    pub async fn load(
        tracker: EventTracker,
        chain: Arc<dyn ChainClient>,
        cursors: Arc<dyn EventCursorStore>,
        config: PollerConfig,
    ) -> Result<Self, StoreError> {
        let cursor = cursors.get(&tracker.event_type).await?;
        Ok(Self {
            tracker,
            chain,
            cursors,
            config,
            cursor,
        })
    }

    pub fn tracker(&self) -> &EventTracker {
        &self.tracker
    }

    pub fn cursor(&self) -> Option<&EventCursor> {
        self.cursor.as_ref()
    }

    /// One iteration: fetch the next page and, if non-empty, handle it and
    /// advance the cursor.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, PollError> {
        let page = self
            .chain
            .query_events(
                &self.tracker.filter,
                self.cursor.as_ref(),
                self.config.page_limit,
                SortOrder::Ascending,
            )
            .await?;

        if page.is_empty() {
            return Ok(PollOutcome {
                events: 0,
                has_next_page: page.has_next_page,
                advanced_to: None,
            });
        }

        self.tracker
            .handler
            .handle(&page.data, &self.tracker.event_type)
            .await?;

        let advanced_to = match page.next_cursor {
            Some(next) => {
                self.cursors.upsert(&self.tracker.event_type, &next).await?;
                self.cursor = Some(next.clone());
                Some(next)
            }
            None => {
                warn!(
                    events = page.data.len(),
                    cursor = ?self.cursor.as_ref().map(ToString::to_string),
                    "node returned events without a next cursor; batch will be redelivered"
                );
                None
            }
        };

        Ok(PollOutcome {
            events: page.data.len(),
            has_next_page: page.has_next_page,
            advanced_to,
        })
    }

    /// Delay before the next iteration: none while a backlog is draining,
    /// the polling interval when caught up, the retry interval after errors.
    ///
    /// A batch that did not move the cursor never drains without delay, or
    /// the same page would be re-handled in a hot loop.
    pub fn next_delay(&self, result: &Result<PollOutcome, PollError>) -> Duration {
        match result {
            Ok(outcome) if outcome.has_next_page && outcome.advanced_to.is_some() => {
                Duration::ZERO
            }
            Ok(_) => self.config.polling_interval,
            Err(_) => self.config.error_retry_interval,
        }
    }

    /// Poll until `shutdown` flips to `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(cursor = ?self.cursor.as_ref().map(ToString::to_string), "tracker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let result = self.poll_once().await;
            match &result {
                Ok(outcome) if outcome.events > 0 => {
                    info!(
                        events = outcome.events,
                        has_next_page = outcome.has_next_page,
                        cursor = ?outcome.advanced_to.as_ref().map(ToString::to_string),
                        "batch processed"
                    );
                }
                Ok(_) => debug!("no new events"),
                Err(err) => {
                    error!(
                        error = %err,
                        transient = err.is_transient(),
                        "poll failed; retrying from unchanged cursor"
                    );
                }
            }

            let delay = self.next_delay(&result);
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("tracker stopped");
    }

    /// Spawn the loop as a task inside a span tagged with the event type.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let name = self.tracker.event_type.clone();
        let span = info_span!("tracker", tracker = %self.tracker.event_type);
        let join = tokio::spawn(self.run(shutdown_rx).instrument(span));
        WorkerHandle {
            name,
            shutdown: shutdown_tx,
            join,
        }
    }
}

/// Handle to stop and join a spawned tracker loop.
#[derive(Debug)]
pub struct WorkerHandle {
    name: String,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the loop to exit.
    ///
    /// A loop that already died (panicked handler) is logged and its
    /// `JoinError` returned.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        // The receiver is gone if the loop already exited.
        let _ = self.shutdown.send(true);
        self.join.await.inspect_err(|err| {
            error!(tracker = %self.name, error = %err, "tracker task ended abnormally");
        })
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
