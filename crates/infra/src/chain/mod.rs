//! Chain node access.
//!
//! The indexer needs exactly two node calls: paginated event queries and
//! single-object reads. [`ChainClient`] is that contract; [`JsonRpcChainClient`]
//! speaks it over the node's JSON-RPC API.

pub mod json_rpc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use coffeeclub_core::ObjectId;
use coffeeclub_events::{EventCursor, EventFilter, EventPage};

pub use json_rpc::JsonRpcChainClient;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ChainError {
    /// Network-level failures worth tagging as transient in logs.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainError::Timeout(_) | ChainError::RateLimited(_) | ChainError::Transport(_)
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Move object content as returned by an object read.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectContent {
    pub object_id: ObjectId,
    pub object_type: Option<String>,
    pub fields: JsonValue,
}

impl ObjectContent {
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    /// Variant name of a Move enum field (`{"variant": "..."}`).
    pub fn variant(&self, name: &str) -> Option<&str> {
        self.field(name)?.get("variant")?.as_str()
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch the page of events matching `filter` after `cursor`.
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventCursor>,
        limit: usize,
        order: SortOrder,
    ) -> Result<EventPage, ChainError>;

    /// Read an object's current content; `None` if it does not exist (or was deleted).
    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectContent>, ChainError>;
}
