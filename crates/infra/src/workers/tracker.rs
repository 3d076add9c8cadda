//! Static table of tracked event types.

use std::sync::Arc;

use coffeeclub_events::{EventFilter, EventKind, EventTypeResolver};

use crate::projections::EventHandler;

/// One polled event stream: its cursor key, node filter and handler.
#[derive(Clone)]
pub struct EventTracker {
    /// Event kinds delivered on this stream.
    pub kinds: Vec<EventKind>,
    /// Cursor-store key and log label: the Move event type for single-type
    /// streams, `<package>::<module>` for module streams.
    pub event_type: String,
    pub filter: EventFilter,
    pub handler: Arc<dyn EventHandler>,
}

impl core::fmt::Debug for EventTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventTracker")
            .field("kinds", &self.kinds)
            .field("event_type", &self.event_type)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl EventTracker {
    /// Stream of exactly one event type.
    pub fn new(resolver: &EventTypeResolver, kind: EventKind, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            kinds: vec![kind],
            event_type: resolver.event_type(kind),
            filter: resolver.filter(kind),
            handler,
        }
    }

    /// Every event the module defines, in on-chain order. The handler gets
    /// `kinds` plus anything else the module emits and must skip the rest.
    pub fn module_stream(
        resolver: &EventTypeResolver,
        kinds: &[EventKind],
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            kinds: kinds.to_vec(),
            event_type: resolver.module_path(),
            filter: resolver.module_filter(),
            handler,
        }
    }

    pub fn tracks(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Fixed, ordered set of trackers built once at startup.
#[derive(Debug, Clone)]
pub struct TrackerRegistry {
    trackers: Vec<EventTracker>,
}

impl TrackerRegistry {
    /// The coffee club trackers.
    ///
    /// Cafe creation has its own stream. Order creation and order updates
    /// share one module stream so an order's creation is always handled
    /// before its updates.
    pub fn coffee_club(
        resolver: &EventTypeResolver,
        cafes: Arc<dyn EventHandler>,
        orders: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            trackers: vec![
                EventTracker::new(resolver, EventKind::CafeCreated, cafes),
                EventTracker::module_stream(
                    resolver,
                    &[EventKind::CoffeeOrderCreated, EventKind::CoffeeOrderUpdated],
                    orders,
                ),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventTracker> {
        self.trackers.iter()
    }

    /// Tracker whose stream carries `kind`.
    pub fn get(&self, kind: EventKind) -> Option<&EventTracker> {
        self.trackers.iter().find(|t| t.tracks(kind))
    }
}

impl IntoIterator for TrackerRegistry {
    type Item = EventTracker;
    type IntoIter = std::vec::IntoIter<EventTracker>;

    fn into_iter(self) -> Self::IntoIter {
        self.trackers.into_iter()
    }
}
