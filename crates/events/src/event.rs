use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::wire;

/// Position of an event on chain (transaction digest + index within it).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    pub tx_digest: String,
    #[serde(with = "wire::u64_string")]
    pub event_seq: u64,
}

/// A raw event as returned by the node.
///
/// `type` is the fully qualified Move struct (`<package>::<module>::<Name>`);
/// `parsedJson` carries the struct fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    pub parsed_json: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(
        default,
        with = "wire::opt_u64_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_ms: Option<u64>,
}

impl ChainEvent {
    pub fn new(id: EventId, event_type: impl Into<String>, parsed_json: JsonValue) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            parsed_json,
            sender: None,
            timestamp_ms: None,
        }
    }
}
