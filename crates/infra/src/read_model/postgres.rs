//! Postgres-backed projection store.
//!
//! Tables are created by [`crate::db::ensure_schema`]. All writes are
//! single-statement upserts keyed by object id, so concurrent trackers writing
//! the same row need no extra locking.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use coffeeclub_core::{Cafe, CoffeeOrder, ObjectId, OrderStatus, SuiAddress};

use super::{ProjectionStore, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresProjectionStore {
    pool: Arc<PgPool>,
}

impl PostgresProjectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn corrupt(column: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{column}: {err}"))
}

#[async_trait]
impl ProjectionStore for PostgresProjectionStore {
    #[instrument(skip(self), fields(cafe_id = %object_id))]
    async fn upsert_cafe(
        &self,
        object_id: &ObjectId,
        creator: &SuiAddress,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cafes (object_id, creator, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (object_id)
            DO UPDATE SET creator = EXCLUDED.creator
            "#,
        )
        .bind(object_id.as_str())
        .bind(creator.as_str())
        .bind(created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find_cafe(&self, object_id: &ObjectId) -> Result<Option<Cafe>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT object_id, creator, created_at
            FROM cafes
            WHERE object_id = $1
            "#,
        )
        .bind(object_id.as_str())
        .fetch_optional(&*self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let creator: String = row.try_get("creator")?;
        Ok(Some(Cafe {
            object_id: object_id.clone(),
            creator: SuiAddress::parse(&creator).map_err(|e| corrupt("creator", e))?,
            created_at: row.try_get("created_at")?,
        }))
    }

    #[instrument(skip(self), fields(order_id = %object_id))]
    async fn upsert_order(
        &self,
        object_id: &ObjectId,
        created_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO coffee_orders (object_id, status, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (object_id) DO NOTHING
            "#,
        )
        .bind(object_id.as_str())
        .bind(OrderStatus::Created.as_str())
        .bind(created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %object_id, status = %status))]
    async fn update_order_status(
        &self,
        object_id: &ObjectId,
        status: OrderStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE coffee_orders
            SET status = $2, updated_at = NOW()
            WHERE object_id = $1
            "#,
        )
        .bind(object_id.as_str())
        .bind(status.as_str())
        .execute(&*self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_order(&self, object_id: &ObjectId) -> Result<Option<CoffeeOrder>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT status, created_at
            FROM coffee_orders
            WHERE object_id = $1
            "#,
        )
        .bind(object_id.as_str())
        .fetch_optional(&*self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let status: String = row.try_get("status")?;
        Ok(Some(CoffeeOrder {
            object_id: object_id.clone(),
            status: OrderStatus::from_variant(&status).map_err(|e| corrupt("status", e))?,
            created_at: row.try_get("created_at")?,
        }))
    }
}
