//! Typed views over `parsedJson` for the tracked events.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use coffeeclub_core::{DomainError, ObjectId, OrderStatus, SuiAddress};

use crate::kind::EventKind;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("malformed {kind:?} payload: {source}")]
    Malformed {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// A Move enum value as rendered by the node: `{"variant": "Processing", "fields": {}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveVariant {
    pub variant: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CafeCreated {
    pub cafe_id: ObjectId,
    pub creator: SuiAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoffeeOrderCreated {
    pub order_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoffeeOrderUpdated {
    pub order_id: ObjectId,
    #[serde(default)]
    pub status: Option<MoveVariant>,
}

impl CoffeeOrderUpdated {
    /// Status embedded in the event, if the event carries one.
    pub fn status(&self) -> Result<Option<OrderStatus>, PayloadError> {
        self.status
            .as_ref()
            .map(|v| OrderStatus::from_variant(&v.variant))
            .transpose()
            .map_err(PayloadError::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoffeeClubEvent {
    CafeCreated(CafeCreated),
    CoffeeOrderCreated(CoffeeOrderCreated),
    CoffeeOrderUpdated(CoffeeOrderUpdated),
}

impl CoffeeClubEvent {
    pub fn decode(kind: EventKind, parsed_json: &JsonValue) -> Result<Self, PayloadError> {
        let malformed = |source| PayloadError::Malformed { kind, source };
        Ok(match kind {
            EventKind::CafeCreated => Self::CafeCreated(
                CafeCreated::deserialize(parsed_json).map_err(malformed)?,
            ),
            EventKind::CoffeeOrderCreated => Self::CoffeeOrderCreated(
                CoffeeOrderCreated::deserialize(parsed_json).map_err(malformed)?,
            ),
            EventKind::CoffeeOrderUpdated => Self::CoffeeOrderUpdated(
                CoffeeOrderUpdated::deserialize(parsed_json).map_err(malformed)?,
            ),
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::CafeCreated(_) => EventKind::CafeCreated,
            Self::CoffeeOrderCreated(_) => EventKind::CoffeeOrderCreated,
            Self::CoffeeOrderUpdated(_) => EventKind::CoffeeOrderUpdated,
        }
    }
}
