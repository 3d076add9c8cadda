//! Event handlers that maintain the cafe and order projections.
//!
//! Handlers receive whole batches from a tracker and must tolerate
//! at-least-once delivery:
//! - **Idempotent**: re-applying a batch converges on the same records
//! - **Skip, don't block**: a malformed single event is logged and skipped
//! - **Fail the batch** on store/chain errors so the cursor stays put

pub mod cafes;
pub mod cursor_store;
pub mod fulfillment;
pub mod orders;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use coffeeclub_events::{ChainEvent, CoffeeClubEvent, EventTypeResolver};

use crate::chain::ChainError;
use crate::read_model::StoreError;

pub use cafes::CafeProjection;
pub use cursor_store::{EventCursorStore, InMemoryCursorStore, PostgresCursorStore};
pub use fulfillment::{BrewOutcome, OnChainOrder, OrderFulfillment, Reconciliation};
pub use orders::{OrderProjection, UpdateOutcome};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl HandlerError {
    pub fn is_transient(&self) -> bool {
        match self {
            HandlerError::Chain(e) => e.is_transient(),
            HandlerError::Store(_) => false,
        }
    }
}

/// Callback a tracker invokes with each non-empty batch.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, events: &[ChainEvent], event_type: &str) -> Result<(), HandlerError>;
}

/// Decode an event this package emits; `None` (after logging) for anything
/// foreign or malformed.
pub(crate) fn decode_event(
    resolver: &EventTypeResolver,
    event: &ChainEvent,
) -> Option<CoffeeClubEvent> {
    let Some(kind) = resolver.resolve(&event.event_type) else {
        debug!(event_type = %event.event_type, "ignoring untracked event type");
        return None;
    };
    match CoffeeClubEvent::decode(kind, &event.parsed_json) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(
                tx_digest = %event.id.tx_digest,
                event_seq = event.id.event_seq,
                error = %err,
                "skipping malformed event"
            );
            None
        }
    }
}
