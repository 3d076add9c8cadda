use serde::{Deserialize, Serialize};

use crate::event::ChainEvent;
use crate::wire;

/// Resumption point in a node's event stream.
///
/// Opaque to the indexer: it is only ever set to a value the node returned as
/// `nextCursor`, and handed back verbatim on the next query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCursor {
    pub tx_digest: String,
    #[serde(with = "wire::u64_string")]
    pub event_seq: u64,
}

impl EventCursor {
    pub fn new(tx_digest: impl Into<String>, event_seq: u64) -> Self {
        Self {
            tx_digest: tx_digest.into(),
            event_seq,
        }
    }
}

impl core::fmt::Display for EventCursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.tx_digest, self.event_seq)
    }
}

/// One page of `queryEvents` results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub data: Vec<ChainEvent>,
    #[serde(default)]
    pub next_cursor: Option<EventCursor>,
    #[serde(default)]
    pub has_next_page: bool,
}

impl EventPage {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
