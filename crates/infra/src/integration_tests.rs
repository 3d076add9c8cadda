//! Integration tests for the full indexing pipeline.
//!
//! Tests: ChainClient → EventPoller → EventHandler → ProjectionStore / Actuator
//!
//! Verifies:
//! - Redelivered batches converge and never brew twice
//! - Cursors only advance past fully handled batches
//! - Brewing is gated on the live on-chain order status

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use coffeeclub_core::{CoffeeType, ObjectId, OrderStatus};
    use coffeeclub_events::{ChainEvent, EventCursor, EventKind};

    use crate::chain::ChainError;
    use crate::config::IndexerConfig;
    use crate::indexer::{Components, Indexer, Stores};
    use crate::projections::{
        CafeProjection, EventCursorStore, InMemoryCursorStore, OrderFulfillment, OrderProjection,
    };
    use crate::read_model::{InMemoryProjectionStore, ProjectionStore};
    use crate::test_support::{
        FakeChainClient, RecordingActuator, event, order_object, page, resolver,
    };
    use crate::workers::{EventPoller, PollError, PollerConfig, TrackerRegistry};

    const MAC: &str = "AA:BB:CC:DD:EE:FF";

    struct Pipeline {
        chain: Arc<FakeChainClient>,
        projections: Arc<InMemoryProjectionStore>,
        cursors: Arc<InMemoryCursorStore>,
        actuator: Arc<RecordingActuator>,
        registry: TrackerRegistry,
    }

    fn pipeline() -> Pipeline {
        let chain = Arc::new(FakeChainClient::new());
        let projections = Arc::new(InMemoryProjectionStore::new());
        let actuator = Arc::new(RecordingActuator::new());
        let r = resolver();

        let cafes = Arc::new(CafeProjection::new(projections.clone(), r.clone()));
        let fulfillment = OrderFulfillment::new(chain.clone(), actuator.clone(), Some(MAC.into()));
        let orders = Arc::new(OrderProjection::new(projections.clone(), r.clone(), fulfillment));

        Pipeline {
            chain,
            projections,
            cursors: Arc::new(InMemoryCursorStore::new()),
            actuator,
            registry: TrackerRegistry::coffee_club(&r, cafes, orders),
        }
    }

    impl Pipeline {
        async fn poller(&self, kind: EventKind) -> EventPoller {
            self.poller_with(kind, self.cursors.clone()).await
        }

        async fn poller_with(
            &self,
            kind: EventKind,
            cursors: Arc<InMemoryCursorStore>,
        ) -> EventPoller {
            let tracker = self.registry.get(kind).unwrap().clone();
            EventPoller::load(tracker, self.chain.clone(), cursors, PollerConfig::default())
                .await
                .unwrap()
        }

        fn push(&self, kind: EventKind, events: Vec<ChainEvent>, next: &str, has_next: bool) {
            let filter = &self.registry.get(kind).unwrap().filter;
            self.chain.push_page(
                filter,
                Ok(page(events, Some(EventCursor::new(next, 0)), has_next)),
            );
        }

        fn queried(&self, kind: EventKind) -> Vec<Option<EventCursor>> {
            self.chain
                .queried_cursors(&self.registry.get(kind).unwrap().filter)
        }

        async fn status(&self, id: &ObjectId) -> OrderStatus {
            self.projections.find_order(id).await.unwrap().unwrap().status
        }

        /// Index order `id` through the order stream.
        async fn create_order(&self, id: &ObjectId) {
            self.push(
                EventKind::CoffeeOrderCreated,
                vec![created(id, "txc")],
                "txc",
                false,
            );
            self.poller(EventKind::CoffeeOrderCreated)
                .await
                .poll_once()
                .await
                .unwrap();
        }
    }

    fn order_id() -> ObjectId {
        ObjectId::parse("0xa").unwrap()
    }

    fn cafe_created(cafe: &str, tx: &str) -> ChainEvent {
        event(
            EventKind::CafeCreated,
            tx,
            0,
            json!({ "cafe_id": cafe, "creator": "0xb0b" }),
        )
    }

    fn created(id: &ObjectId, tx: &str) -> ChainEvent {
        event(
            EventKind::CoffeeOrderCreated,
            tx,
            0,
            json!({ "order_id": id.as_str() }),
        )
    }

    fn updated(id: &ObjectId, status: &str, tx: &str) -> ChainEvent {
        event(
            EventKind::CoffeeOrderUpdated,
            tx,
            0,
            json!({ "order_id": id.as_str(), "status": { "variant": status, "fields": {} } }),
        )
    }

    #[tokio::test]
    async fn redelivered_cafe_creation_is_idempotent() {
        let p = pipeline();
        p.push(EventKind::CafeCreated, vec![cafe_created("0xcafe", "tx1")], "tx1", false);
        p.push(EventKind::CafeCreated, vec![cafe_created("0xcafe", "tx1")], "tx1", false);

        let mut poller = p.poller(EventKind::CafeCreated).await;
        poller.poll_once().await.unwrap();
        let once = p.projections.cafes();
        poller.poll_once().await.unwrap();

        assert_eq!(once.len(), 1);
        assert_eq!(p.projections.cafes(), once);
    }

    #[tokio::test]
    async fn replayed_processing_batch_after_crash_does_not_rebrew() {
        let p = pipeline();
        let id = order_id();
        p.create_order(&id).await;
        p.chain.put_object(order_object(&id, "Processing", Some("Latte")));

        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx1")], "tx1", false);
        p.poller(EventKind::CoffeeOrderUpdated)
            .await
            .poll_once()
            .await
            .unwrap();
        assert_eq!(p.actuator.calls().len(), 1);

        // Restart with the cursor write lost: the same batch comes again.
        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx1")], "tx1", false);
        let mut restarted = p
            .poller_with(EventKind::CoffeeOrderUpdated, Arc::new(InMemoryCursorStore::new()))
            .await;
        assert!(restarted.cursor().is_none());
        restarted.poll_once().await.unwrap();

        assert_eq!(p.actuator.calls().len(), 1);
        assert_eq!(p.status(&id).await, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn one_brew_per_processing_transition() {
        let p = pipeline();
        let id = order_id();
        p.create_order(&id).await;
        p.chain.put_object(order_object(&id, "Processing", None));

        p.push(
            EventKind::CoffeeOrderUpdated,
            vec![updated(&id, "Processing", "tx1"), updated(&id, "Processing", "tx2")],
            "tx2",
            true,
        );
        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Completed", "tx3")], "tx3", false);

        let mut poller = p.poller(EventKind::CoffeeOrderUpdated).await;
        let first = poller.poll_once().await.unwrap();
        assert!(first.has_next_page);
        p.chain.put_object(order_object(&id, "Completed", None));
        poller.poll_once().await.unwrap();

        assert_eq!(p.actuator.calls(), vec![(MAC.to_string(), CoffeeType::Espresso)]);
        assert_eq!(p.status(&id).await, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn cursor_advances_to_each_batch_next_cursor() {
        let p = pipeline();
        for n in 1..=3 {
            let tx = format!("tx{n}");
            p.push(
                EventKind::CafeCreated,
                vec![cafe_created(&format!("0xcafe{n}"), &tx)],
                &tx,
                n < 3,
            );
        }

        let mut poller = p.poller(EventKind::CafeCreated).await;
        for _ in 0..3 {
            poller.poll_once().await.unwrap();
        }

        let event_type = p.registry.get(EventKind::CafeCreated).unwrap().event_type.clone();
        let written: Vec<_> = p.cursors.history().into_iter().map(|(k, c)| {
            assert_eq!(k, event_type);
            c.tx_digest
        }).collect();
        assert_eq!(written, vec!["tx1", "tx2", "tx3"]);
        assert_eq!(
            p.cursors.get(&event_type).await.unwrap(),
            Some(EventCursor::new("tx3", 0))
        );
        assert_eq!(
            p.queried(EventKind::CafeCreated),
            vec![
                None,
                Some(EventCursor::new("tx1", 0)),
                Some(EventCursor::new("tx2", 0)),
            ]
        );
        assert_eq!(p.projections.cafes().len(), 3);
    }

    #[tokio::test]
    async fn failed_batch_is_requeried_from_unchanged_cursor() {
        let p = pipeline();
        let id = order_id();
        p.create_order(&id).await;

        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Created", "tx1")], "tx1", false);
        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx2")], "tx2", false);
        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx2")], "tx2", false);

        let mut poller = p.poller(EventKind::CoffeeOrderUpdated).await;
        poller.poll_once().await.unwrap();

        p.chain.fail_object_reads(ChainError::Transport("connection reset".into()));
        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, PollError::Handler(_)));
        assert!(err.is_transient());
        assert_eq!(poller.cursor(), Some(&EventCursor::new("tx1", 0)));
        assert!(p.actuator.calls().is_empty());

        p.chain.clear_object_failure();
        p.chain.put_object(order_object(&id, "Processing", Some("Doppio")));
        poller.poll_once().await.unwrap();

        let queried = p.queried(EventKind::CoffeeOrderUpdated);
        let n = queried.len();
        assert_eq!(queried[n - 2], Some(EventCursor::new("tx1", 0)));
        assert_eq!(queried[n - 1], queried[n - 2]);
        assert_eq!(p.actuator.calls(), vec![(MAC.to_string(), CoffeeType::Doppio)]);
        assert_eq!(poller.cursor(), Some(&EventCursor::new("tx2", 0)));
    }

    #[tokio::test]
    async fn processing_update_brews_when_chain_confirms() {
        let p = pipeline();
        let id = order_id();
        p.create_order(&id).await;
        assert_eq!(p.status(&id).await, OrderStatus::Created);
        p.chain.put_object(order_object(&id, "Processing", Some("Espresso")));

        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx1")], "tx1", false);
        p.poller(EventKind::CoffeeOrderUpdated)
            .await
            .poll_once()
            .await
            .unwrap();

        assert_eq!(p.status(&id).await, OrderStatus::Processing);
        assert_eq!(p.actuator.calls(), vec![(MAC.to_string(), CoffeeType::Espresso)]);
        assert_eq!(CoffeeType::Espresso.as_arg(), "espresso");
    }

    #[tokio::test]
    async fn processing_update_does_not_brew_when_chain_disagrees() {
        let p = pipeline();
        let id = order_id();
        p.create_order(&id).await;
        p.chain.put_object(order_object(&id, "Completed", Some("Espresso")));

        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx1")], "tx1", false);
        let mut poller = p.poller(EventKind::CoffeeOrderUpdated).await;
        poller.poll_once().await.unwrap();

        assert_eq!(p.status(&id).await, OrderStatus::Processing);
        assert!(p.actuator.calls().is_empty());
        assert_eq!(poller.cursor(), Some(&EventCursor::new("tx1", 0)));
    }

    #[tokio::test]
    async fn malformed_event_is_skipped_and_batch_advances() {
        let p = pipeline();
        let bad = event(EventKind::CafeCreated, "tx1", 0, json!({ "cafe_id": 42 }));
        p.push(
            EventKind::CafeCreated,
            vec![bad, cafe_created("0xcafe", "tx1")],
            "tx1",
            false,
        );

        let mut poller = p.poller(EventKind::CafeCreated).await;
        let outcome = poller.poll_once().await.unwrap();

        assert_eq!(outcome.events, 2);
        assert_eq!(p.projections.cafes().len(), 1);
        assert_eq!(poller.cursor(), Some(&EventCursor::new("tx1", 0)));
    }

    #[tokio::test]
    async fn update_for_unknown_order_is_dropped() {
        let p = pipeline();
        let id = order_id();
        p.chain.put_object(order_object(&id, "Processing", None));
        p.push(EventKind::CoffeeOrderUpdated, vec![updated(&id, "Processing", "tx1")], "tx1", false);

        let mut poller = p.poller(EventKind::CoffeeOrderUpdated).await;
        poller.poll_once().await.unwrap();

        assert!(p.projections.find_order(&id).await.unwrap().is_none());
        assert!(p.actuator.calls().is_empty());
        assert_eq!(poller.cursor(), Some(&EventCursor::new("tx1", 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn indexer_runs_every_tracker_until_shutdown() {
        let config = IndexerConfig::from_lookup(|key| match key {
            "PACKAGE_ID" => Some("0xc0ffee".into()),
            "COFFEE_MACHINE_MAC" => Some(MAC.into()),
            _ => None,
        })
        .unwrap();

        let p = pipeline();
        let stores = Stores::in_memory();
        p.push(EventKind::CafeCreated, vec![cafe_created("0xcafe", "tx1")], "tx1", false);
        p.push(EventKind::CoffeeOrderCreated, vec![created(&order_id(), "tx2")], "tx2", false);

        let indexer = Indexer::start_with(
            &config,
            Components {
                chain: p.chain.clone(),
                stores: stores.clone(),
                actuator: p.actuator.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(indexer.worker_count(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(stores
            .projections
            .find_cafe(&ObjectId::parse("0xcafe").unwrap())
            .await
            .unwrap()
            .is_some());
        assert_eq!(
            stores.projections.find_order(&order_id()).await.unwrap().map(|o| o.status),
            Some(OrderStatus::Created)
        );
        for kind in EventKind::ALL {
            assert!(!p.queried(kind).is_empty());
        }

        indexer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn order_update_after_failed_poll_still_brews() {
        let config = IndexerConfig::from_lookup(|key| match key {
            "PACKAGE_ID" => Some("0xc0ffee".into()),
            "COFFEE_MACHINE_MAC" => Some(MAC.into()),
            _ => None,
        })
        .unwrap();

        let p = pipeline();
        let stores = Stores::in_memory();
        let id = order_id();
        let orders = p.registry.get(EventKind::CoffeeOrderUpdated).unwrap().filter.clone();
        p.chain
            .push_page(&orders, Err(ChainError::RateLimited("too many requests".into())));
        p.push(
            EventKind::CoffeeOrderUpdated,
            vec![created(&id, "tx1"), updated(&id, "Processing", "tx2")],
            "tx2",
            false,
        );
        p.chain.put_object(order_object(&id, "Processing", Some("Latte")));

        let indexer = Indexer::start_with(
            &config,
            Components {
                chain: p.chain.clone(),
                stores: stores.clone(),
                actuator: p.actuator.clone(),
            },
        )
        .await
        .unwrap();

        tokio::time::sleep(config.error_retry_interval + Duration::from_secs(1)).await;
        assert_eq!(
            stores.projections.find_order(&id).await.unwrap().map(|o| o.status),
            Some(OrderStatus::Processing)
        );
        assert_eq!(p.actuator.calls(), vec![(MAC.to_string(), CoffeeType::Latte)]);
        assert_eq!(
            stores.cursors.get(&resolver().module_path()).await.unwrap(),
            Some(EventCursor::new("tx2", 0))
        );

        indexer.shutdown().await;
    }
}
