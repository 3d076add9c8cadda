use serde::{Deserialize, Serialize};

/// Event query predicate, serialized in the node's JSON-RPC shape.
///
/// ```json
/// {"MoveEventType": "0x..::coffee_club::CafeCreated"}
/// {"MoveEventModule": {"package": "0x..", "module": "coffee_club"}}
/// ```
///
/// `MoveEventModule` matches on the module that *defines* the event type,
/// not the module of the transaction that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFilter {
    MoveEventType(String),
    MoveEventModule { package: String, module: String },
}
