use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use coffeeclub_events::{CafeCreated, ChainEvent, CoffeeClubEvent, EventTypeResolver};

use super::{EventHandler, HandlerError, decode_event};
use crate::read_model::ProjectionStore;

/// Projects `CafeCreated` events into cafe records.
pub struct CafeProjection {
    store: Arc<dyn ProjectionStore>,
    resolver: EventTypeResolver,
}

impl CafeProjection {
    pub fn new(store: Arc<dyn ProjectionStore>, resolver: EventTypeResolver) -> Self {
        Self { store, resolver }
    }

    pub async fn apply(&self, event: &CafeCreated) -> Result<(), HandlerError> {
        self.store
            .upsert_cafe(&event.cafe_id, &event.creator, Utc::now())
            .await?;
        info!(cafe_id = %event.cafe_id, creator = %event.creator, "cafe indexed");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for CafeProjection {
    async fn handle(&self, events: &[ChainEvent], event_type: &str) -> Result<(), HandlerError> {
        for event in events {
            match decode_event(&self.resolver, event) {
                Some(CoffeeClubEvent::CafeCreated(cafe)) => self.apply(&cafe).await?,
                Some(other) => {
                    debug!(tracker = event_type, kind = ?other.kind(), "cafe handler skipping event");
                }
                None => {}
            }
        }
        Ok(())
    }
}
