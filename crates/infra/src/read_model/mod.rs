//! Projection storage for cafes and coffee orders.
//!
//! The chain is the source of truth; these records are a rebuildable cache.
//! Every write is a keyed upsert that is safe to repeat, so handlers can be
//! re-run on redelivered batches and converge on the same state.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use coffeeclub_core::{Cafe, CoffeeOrder, ObjectId, OrderStatus, SuiAddress};

pub use in_memory::InMemoryProjectionStore;
pub use postgres::PostgresProjectionStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

#[async_trait]
pub trait ProjectionStore: Send + Sync {
    /// Insert or refresh a cafe. `created_at` is only written on first insert.
    async fn upsert_cafe(
        &self,
        object_id: &ObjectId,
        creator: &SuiAddress,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_cafe(&self, object_id: &ObjectId) -> Result<Option<Cafe>, StoreError>;

    /// Record a newly created order.
    ///
    /// Create-only: an existing record keeps its status and `created_at`, so a
    /// redelivered creation event cannot move an order back to `Created`.
    async fn upsert_order(
        &self,
        object_id: &ObjectId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Set an existing order's status. Returns `false` if the order is unknown.
    async fn update_order_status(
        &self,
        object_id: &ObjectId,
        status: OrderStatus,
    ) -> Result<bool, StoreError>;

    async fn find_order(&self, object_id: &ObjectId) -> Result<Option<CoffeeOrder>, StoreError>;
}
