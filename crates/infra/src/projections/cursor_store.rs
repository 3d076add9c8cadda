//! Event cursor persistence.
//!
//! One row per tracked event type holding the last `nextCursor` whose batch
//! was fully handled. This enables:
//! - Resume after crash (trackers continue from the stored cursor)
//! - At-least-once delivery (a failed batch is re-queried from the old cursor)
//! - Deterministic rebuilds (drop the rows and replay from the stream start)

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use coffeeclub_events::EventCursor;

use crate::read_model::StoreError;

#[async_trait]
pub trait EventCursorStore: Send + Sync {
    /// Last persisted cursor for `event_type`; `None` means start of stream.
    async fn get(&self, event_type: &str) -> Result<Option<EventCursor>, StoreError>;

    /// Persist `cursor` as the resumption point for `event_type`.
    async fn upsert(&self, event_type: &str, cursor: &EventCursor) -> Result<(), StoreError>;
}

/// In-memory cursor store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    cursors: RwLock<HashMap<String, EventCursor>>,
    history: RwLock<Vec<(String, EventCursor)>>,
}

impl InMemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every cursor written, in write order.
    pub fn history(&self) -> Vec<(String, EventCursor)> {
        self.history.read().map(|h| h.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventCursorStore for InMemoryCursorStore {
    async fn get(&self, event_type: &str) -> Result<Option<EventCursor>, StoreError> {
        let cursors = self
            .cursors
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;
        Ok(cursors.get(event_type).cloned())
    }

    async fn upsert(&self, event_type: &str, cursor: &EventCursor) -> Result<(), StoreError> {
        self.cursors
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?
            .insert(event_type.to_string(), cursor.clone());
        if let Ok(mut history) = self.history.write() {
            history.push((event_type.to_string(), cursor.clone()));
        }
        Ok(())
    }
}

/// Postgres-backed cursor store (`event_cursors` table).
#[derive(Debug, Clone)]
pub struct PostgresCursorStore {
    pool: Arc<PgPool>,
}

impl PostgresCursorStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl EventCursorStore for PostgresCursorStore {
    async fn get(&self, event_type: &str) -> Result<Option<EventCursor>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT event_seq, tx_digest
            FROM event_cursors
            WHERE event_type = $1
            "#,
        )
        .bind(event_type)
        .fetch_optional(&*self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let seq: i64 = row.try_get("event_seq")?;
        let event_seq = u64::try_from(seq)
            .map_err(|_| StoreError::Corrupt(format!("negative event_seq {seq} for {event_type}")))?;
        Ok(Some(EventCursor::new(
            row.try_get::<String, _>("tx_digest")?,
            event_seq,
        )))
    }

    async fn upsert(&self, event_type: &str, cursor: &EventCursor) -> Result<(), StoreError> {
        let seq = i64::try_from(cursor.event_seq)
            .map_err(|_| StoreError::Corrupt(format!("event_seq {} overflows BIGINT", cursor.event_seq)))?;
        sqlx::query(
            r#"
            INSERT INTO event_cursors (event_type, event_seq, tx_digest)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_type)
            DO UPDATE SET
                event_seq = EXCLUDED.event_seq,
                tx_digest = EXCLUDED.tx_digest,
                updated_at = NOW()
            "#,
        )
        .bind(event_type)
        .bind(seq)
        .bind(&cursor.tx_digest)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}
