//! Coffee order projection and its status state machine.
//!
//! Observed lifecycle: `Created -> Processing -> {Completed, Cancelled}`.
//! Transitions are driven by on-chain events; the only edge with a physical
//! side effect is the one *into* `Processing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::ObjectId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Created,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Parse the Move enum variant name (`{"variant": "Processing"}`).
    pub fn from_variant(variant: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(variant.trim()))
            .ok_or_else(|| DomainError::unknown_variant("order status", variant))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::Processing => "Processing",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A locally observed status change for one order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl StatusTransition {
    pub fn new(from: OrderStatus, to: OrderStatus) -> Self {
        Self { from, to }
    }

    /// True only for a genuine `* -> Processing` edge.
    ///
    /// A redelivered "became processing" event finds the order already
    /// `Processing` locally and must not trigger another brew.
    pub fn enters_processing(&self) -> bool {
        self.from != OrderStatus::Processing && self.to == OrderStatus::Processing
    }
}

/// Beverage requested by an order; passed to the device controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoffeeType {
    #[default]
    Espresso,
    Americano,
    Doppio,
    Long,
    HotWater,
    Cappuccino,
    Latte,
}

impl CoffeeType {
    pub const ALL: [CoffeeType; 7] = [
        CoffeeType::Espresso,
        CoffeeType::Americano,
        CoffeeType::Doppio,
        CoffeeType::Long,
        CoffeeType::HotWater,
        CoffeeType::Cappuccino,
        CoffeeType::Latte,
    ];

    /// Map a Move variant (`HotWater`, `hot_water`, ...) to a beverage.
    ///
    /// Absent or unrecognized variants fall back to the baseline espresso.
    pub fn from_variant_or_default(variant: Option<&str>) -> Self {
        let Some(variant) = variant else {
            return Self::default();
        };
        let wanted: String = variant
            .chars()
            .filter(|c| *c != '_' && !c.is_whitespace())
            .collect();
        Self::ALL
            .into_iter()
            .find(|t| t.as_arg().replace('_', "").eq_ignore_ascii_case(&wanted))
            .unwrap_or_default()
    }

    /// Argument string understood by the controller script.
    pub fn as_arg(&self) -> &'static str {
        match self {
            CoffeeType::Espresso => "espresso",
            CoffeeType::Americano => "americano",
            CoffeeType::Doppio => "doppio",
            CoffeeType::Long => "long",
            CoffeeType::HotWater => "hot_water",
            CoffeeType::Cappuccino => "cappuccino",
            CoffeeType::Latte => "latte",
        }
    }
}

impl core::fmt::Display for CoffeeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Local projection of an on-chain coffee order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoffeeOrder {
    pub object_id: ObjectId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl CoffeeOrder {
    pub fn created(object_id: ObjectId, created_at: DateTime<Utc>) -> Self {
        Self {
            object_id,
            status: OrderStatus::Created,
            created_at,
        }
    }

    /// Transition this order would take if its status became `next`.
    pub fn transition_to(&self, next: OrderStatus) -> StatusTransition {
        StatusTransition::new(self.status, next)
    }
}
