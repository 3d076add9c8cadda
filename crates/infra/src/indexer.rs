//! Startup wiring: turns an [`IndexerConfig`] into running tracker loops.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use coffeeclub_events::EventTypeResolver;

use crate::actuator::{Actuator, ProcessActuator, SerializedActuator};
use crate::chain::{ChainClient, ChainError, JsonRpcChainClient};
use crate::config::{DeviceConfig, IndexerConfig};
use crate::db;
use crate::projections::{
    CafeProjection, EventCursorStore, InMemoryCursorStore, OrderFulfillment, OrderProjection,
    PostgresCursorStore,
};
use crate::read_model::{
    InMemoryProjectionStore, PostgresProjectionStore, ProjectionStore, StoreError,
};
use crate::workers::{EventPoller, PollerConfig, TrackerRegistry, WorkerHandle};

/// Fatal errors that prevent the indexer from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("chain client: {0}")]
    Chain(#[from] ChainError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("no event trackers registered")]
    NoTrackers,
}

/// Cursor and projection persistence, picked once at startup.
#[derive(Clone)]
pub struct Stores {
    pub projections: Arc<dyn ProjectionStore>,
    pub cursors: Arc<dyn EventCursorStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            projections: Arc::new(InMemoryProjectionStore::new()),
            cursors: Arc::new(InMemoryCursorStore::new()),
        }
    }

    /// Postgres when `DATABASE_URL` is set; otherwise in-memory stores that
    /// lose cursors on restart.
    pub async fn from_config(config: &IndexerConfig) -> Result<Self, StoreError> {
        match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url).await?;
                info!("using postgres stores");
                Ok(Self {
                    projections: Arc::new(PostgresProjectionStore::new(pool.clone())),
                    cursors: Arc::new(PostgresCursorStore::new(pool)),
                })
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory stores (cursors reset on restart)");
                Ok(Self::in_memory())
            }
        }
    }
}

/// Process actuator, wrapped in a brew lock when `SERIALIZE_BREWS` is on.
pub fn build_actuator(device: &DeviceConfig) -> Arc<dyn Actuator> {
    let process =
        ProcessActuator::new(device.controller_path.clone()).with_timeout(device.brew_timeout);
    if device.serialize_brews {
        Arc::new(SerializedActuator::new(process))
    } else {
        Arc::new(process)
    }
}

/// Everything the trackers need beyond configuration.
pub struct Components {
    pub chain: Arc<dyn ChainClient>,
    pub stores: Stores,
    pub actuator: Arc<dyn Actuator>,
}

/// Running indexer: one spawned loop per tracker.
pub struct Indexer {
    workers: Vec<WorkerHandle>,
}

impl Indexer {
    /// Connect to the node and stores described by `config`, then start.
    pub async fn start(config: &IndexerConfig) -> Result<Self, StartupError> {
        let chain: Arc<dyn ChainClient> =
            Arc::new(JsonRpcChainClient::new(config.rpc_url.clone(), config.rpc_timeout)?);
        let stores = Stores::from_config(config).await?;
        let actuator = build_actuator(&config.device);

        Self::start_with(
            config,
            Components {
                chain,
                stores,
                actuator,
            },
        )
        .await
    }

    /// Build the registry over `components` and spawn every tracker.
    ///
    /// All cursors are loaded before any loop is spawned, so a broken cursor
    /// store fails startup instead of a single tracker.
    pub async fn start_with(
        config: &IndexerConfig,
        components: Components,
    ) -> Result<Self, StartupError> {
        let Components {
            chain,
            stores,
            actuator,
        } = components;
        let resolver = EventTypeResolver::new(config.package_id.clone(), config.module.clone());

        let cafes = Arc::new(CafeProjection::new(stores.projections.clone(), resolver.clone()));
        let fulfillment =
            OrderFulfillment::new(chain.clone(), actuator, config.device.address.clone());
        let orders = Arc::new(OrderProjection::new(
            stores.projections.clone(),
            resolver.clone(),
            fulfillment,
        ));
        let registry = TrackerRegistry::coffee_club(&resolver, cafes, orders);
        if registry.is_empty() {
            return Err(StartupError::NoTrackers);
        }

        let poller_config = PollerConfig {
            polling_interval: config.polling_interval,
            error_retry_interval: config.error_retry_interval,
            page_limit: config.page_limit,
        };

        let mut pollers = Vec::with_capacity(registry.len());
        for tracker in registry {
            let poller = EventPoller::load(
                tracker,
                chain.clone(),
                stores.cursors.clone(),
                poller_config,
            )
            .await?;
            pollers.push(poller);
        }

        info!(
            package = %config.package_id,
            module = %config.module,
            trackers = pollers.len(),
            "indexer starting"
        );
        let workers = pollers.into_iter().map(EventPoller::spawn).collect();
        Ok(Self { workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop every tracker loop and wait for them to exit.
    pub async fn shutdown(self) {
        let mut failed = 0usize;
        for worker in self.workers {
            if worker.shutdown().await.is_err() {
                failed += 1;
            }
        }
        info!(failed, "indexer stopped");
    }
}
