//! Order reconciliation against live chain state, and the brew it gates.
//!
//! Event payloads and the local projection can both be stale or duplicated.
//! Before anything physical happens, the order object is re-read from the
//! node and the brew only proceeds if the chain itself says `Processing`.
//! Brewing is fire-and-log: failures are reported, never retried, and the
//! order stays `Processing` locally.

use std::sync::Arc;

use tracing::{error, info, warn};

use coffeeclub_core::{CoffeeType, ObjectId, OrderStatus};

use crate::actuator::Actuator;
use crate::chain::{ChainClient, ChainError, ObjectContent};

/// Authoritative order state read from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainOrder {
    pub object_id: ObjectId,
    /// `None` when the object carries no recognizable status.
    pub status: Option<OrderStatus>,
    pub coffee_type: CoffeeType,
}

impl OnChainOrder {
    pub fn from_content(content: &ObjectContent) -> Self {
        Self {
            object_id: content.object_id.clone(),
            status: content
                .variant("status")
                .and_then(|v| OrderStatus::from_variant(v).ok()),
            coffee_type: CoffeeType::from_variant_or_default(content.variant("coffee_type")),
        }
    }
}

/// Verdict of comparing a fresh on-chain read against "should be Processing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Confirmed(OnChainOrder),
    Diverged { on_chain: Option<OrderStatus> },
    Missing,
}

impl Reconciliation {
    pub fn of(snapshot: Option<OnChainOrder>) -> Self {
        match snapshot {
            Some(order) if order.status == Some(OrderStatus::Processing) => Self::Confirmed(order),
            Some(order) => Self::Diverged {
                on_chain: order.status,
            },
            None => Self::Missing,
        }
    }
}

/// What happened to a `* -> Processing` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrewOutcome {
    Brewed { coffee_type: CoffeeType },
    NotConfirmed { on_chain: Option<OrderStatus> },
    OrderMissing,
    DeviceNotConfigured,
    Failed { reason: String },
}

pub struct OrderFulfillment {
    chain: Arc<dyn ChainClient>,
    actuator: Arc<dyn Actuator>,
    device_address: Option<String>,
}

impl OrderFulfillment {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        actuator: Arc<dyn Actuator>,
        device_address: Option<String>,
    ) -> Self {
        Self {
            chain,
            actuator,
            device_address,
        }
    }

    /// Re-read the order object from the node.
    pub async fn fetch(&self, order_id: &ObjectId) -> Result<Option<OnChainOrder>, ChainError> {
        Ok(self
            .chain
            .get_object(order_id)
            .await?
            .as_ref()
            .map(OnChainOrder::from_content))
    }

    /// Brew for `order_id` if `snapshot` confirms it is `Processing` on chain.
    pub async fn fulfill(&self, order_id: &ObjectId, snapshot: Option<OnChainOrder>) -> BrewOutcome {
        match Reconciliation::of(snapshot) {
            Reconciliation::Confirmed(order) => self.brew(&order).await,
            Reconciliation::Diverged { on_chain } => {
                warn!(
                    %order_id,
                    on_chain = ?on_chain,
                    "order is not processing on chain; skipping brew"
                );
                BrewOutcome::NotConfirmed { on_chain }
            }
            Reconciliation::Missing => {
                warn!(%order_id, "order object not found on chain; skipping brew");
                BrewOutcome::OrderMissing
            }
        }
    }

    async fn brew(&self, order: &OnChainOrder) -> BrewOutcome {
        let Some(address) = self.device_address.as_deref() else {
            error!(order_id = %order.object_id, "COFFEE_MACHINE_MAC is not configured; cannot brew");
            return BrewOutcome::DeviceNotConfigured;
        };

        info!(
            order_id = %order.object_id,
            coffee = %order.coffee_type,
            "brewing order"
        );
        match self.actuator.brew(address, order.coffee_type).await {
            Ok(report) => {
                info!(order_id = %order.object_id, stdout = %report.stdout, "brew finished");
                BrewOutcome::Brewed {
                    coffee_type: order.coffee_type,
                }
            }
            Err(err) => {
                error!(order_id = %order.object_id, error = %err, "brew failed; order left processing");
                BrewOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}
