use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use coffeeclub_core::{OrderStatus, StatusTransition};
use coffeeclub_events::{
    ChainEvent, CoffeeClubEvent, CoffeeOrderCreated, CoffeeOrderUpdated, EventTypeResolver,
};

use super::fulfillment::{BrewOutcome, OrderFulfillment};
use super::{EventHandler, HandlerError, decode_event};
use crate::read_model::ProjectionStore;

/// Result of applying one `CoffeeOrderUpdated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No local record; the update is dropped.
    UnknownOrder,
    /// Neither the event nor the chain yielded a usable status.
    StatusUnavailable,
    /// Status recorded; no brew was due (includes redundant `Processing`).
    Updated(StatusTransition),
    /// Status recorded as `Processing` and a brew was attempted or refused.
    Fulfillment(BrewOutcome),
}

/// Projects order events and triggers brewing on `* -> Processing`.
pub struct OrderProjection {
    store: Arc<dyn ProjectionStore>,
    resolver: EventTypeResolver,
    fulfillment: OrderFulfillment,
}

impl OrderProjection {
    pub fn new(
        store: Arc<dyn ProjectionStore>,
        resolver: EventTypeResolver,
        fulfillment: OrderFulfillment,
    ) -> Self {
        Self {
            store,
            resolver,
            fulfillment,
        }
    }

    pub async fn apply_created(&self, event: &CoffeeOrderCreated) -> Result<(), HandlerError> {
        self.store.upsert_order(&event.order_id, Utc::now()).await?;
        info!(order_id = %event.order_id, "order indexed");
        Ok(())
    }

    /// Apply a status update.
    ///
    /// The brew decision is made against the *locally stored* status before
    /// this update is written: only a `non-Processing -> Processing` edge
    /// brews, so redelivered updates are no-ops. The chain is re-read before
    /// the status write, which lets a failed read fail the batch while the
    /// local record still allows a retry to brew.
    pub async fn apply_updated(
        &self,
        event: &CoffeeOrderUpdated,
    ) -> Result<UpdateOutcome, HandlerError> {
        let order_id = &event.order_id;

        let Some(order) = self.store.find_order(order_id).await? else {
            warn!(%order_id, "update for unknown order; skipping");
            return Ok(UpdateOutcome::UnknownOrder);
        };

        let mut snapshot = None;
        let status = match event.status() {
            Ok(Some(status)) => status,
            Ok(None) => {
                let fetched = self.fulfillment.fetch(order_id).await?;
                match fetched.as_ref().and_then(|o| o.status) {
                    Some(status) => {
                        snapshot = Some(fetched);
                        status
                    }
                    None => {
                        warn!(%order_id, "update carries no status and chain has none; skipping");
                        return Ok(UpdateOutcome::StatusUnavailable);
                    }
                }
            }
            Err(err) => {
                warn!(%order_id, error = %err, "update has unrecognized status; skipping");
                return Ok(UpdateOutcome::StatusUnavailable);
            }
        };

        let transition = order.transition_to(status);
        if !transition.enters_processing() {
            self.store.update_order_status(order_id, status).await?;
            if transition.from == OrderStatus::Processing && transition.to == OrderStatus::Processing {
                debug!(%order_id, "order already processing; redundant update");
            } else {
                info!(%order_id, from = %transition.from, to = %transition.to, "order status updated");
            }
            return Ok(UpdateOutcome::Updated(transition));
        }

        let snapshot = match snapshot {
            Some(s) => s,
            None => self.fulfillment.fetch(order_id).await?,
        };
        self.store.update_order_status(order_id, status).await?;
        info!(%order_id, from = %transition.from, "order entered processing");

        Ok(UpdateOutcome::Fulfillment(
            self.fulfillment.fulfill(order_id, snapshot).await,
        ))
    }
}

#[async_trait]
impl EventHandler for OrderProjection {
    async fn handle(&self, events: &[ChainEvent], event_type: &str) -> Result<(), HandlerError> {
        for event in events {
            match decode_event(&self.resolver, event) {
                Some(CoffeeClubEvent::CoffeeOrderCreated(created)) => {
                    self.apply_created(&created).await?
                }
                Some(CoffeeClubEvent::CoffeeOrderUpdated(updated)) => {
                    let outcome = self.apply_updated(&updated).await?;
                    debug!(tracker = event_type, order_id = %updated.order_id, ?outcome, "order update applied");
                }
                Some(other) => {
                    debug!(tracker = event_type, kind = ?other.kind(), "order handler skipping event");
                }
                None => {}
            }
        }
        Ok(())
    }
}
