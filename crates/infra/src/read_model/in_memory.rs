use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use coffeeclub_core::{Cafe, CoffeeOrder, ObjectId, OrderStatus, SuiAddress};

use super::{ProjectionStore, StoreError};

/// In-memory projection store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProjectionStore {
    cafes: RwLock<HashMap<ObjectId, Cafe>>,
    orders: RwLock<HashMap<ObjectId, CoffeeOrder>>,
}

impl InMemoryProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cafes(&self) -> Vec<Cafe> {
        match self.cafes.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    pub fn orders(&self) -> Vec<CoffeeOrder> {
        match self.orders.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Storage("lock poisoned".into())
}

#[async_trait]
impl ProjectionStore for InMemoryProjectionStore {
    async fn upsert_cafe(
        &self,
        object_id: &ObjectId,
        creator: &SuiAddress,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut cafes = self.cafes.write().map_err(poisoned)?;
        cafes
            .entry(object_id.clone())
            .and_modify(|cafe| cafe.creator = creator.clone())
            .or_insert_with(|| Cafe {
                object_id: object_id.clone(),
                creator: creator.clone(),
                created_at,
            });
        Ok(())
    }

    async fn find_cafe(&self, object_id: &ObjectId) -> Result<Option<Cafe>, StoreError> {
        let cafes = self.cafes.read().map_err(poisoned)?;
        Ok(cafes.get(object_id).cloned())
    }

    async fn upsert_order(
        &self,
        object_id: &ObjectId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        orders
            .entry(object_id.clone())
            .or_insert_with(|| CoffeeOrder::created(object_id.clone(), created_at));
        Ok(())
    }

    async fn update_order_status(
        &self,
        object_id: &ObjectId,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().map_err(poisoned)?;
        match orders.get_mut(object_id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_order(&self, object_id: &ObjectId) -> Result<Option<CoffeeOrder>, StoreError> {
        let orders = self.orders.read().map_err(poisoned)?;
        Ok(orders.get(object_id).cloned())
    }
}
