//! Cafe projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ObjectId, SuiAddress};

/// Local projection of an on-chain cafe.
///
/// `created_at` records when the indexer first saw the cafe; later upserts
/// only refresh `creator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cafe {
    pub object_id: ObjectId,
    pub creator: SuiAddress,
    pub created_at: DateTime<Utc>,
}
