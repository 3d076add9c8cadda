//! Chain events consumed by the indexer.
//!
//! - [`ChainEvent`]: one event as delivered by the node (`type` + `parsedJson`)
//! - [`EventCursor`] / [`EventPage`]: resumable pagination over an event stream
//! - [`EventFilter`]: query predicate passed through to the node
//! - [`EventKind`] / [`EventTypeResolver`]: closed set of tracked event types,
//!   matched by exact fully-qualified Move type
//! - [`CoffeeClubEvent`]: typed payloads decoded from `parsedJson`

pub mod cursor;
pub mod event;
pub mod filter;
pub mod kind;
pub mod payload;
mod wire;

pub use cursor::{EventCursor, EventPage};
pub use event::{ChainEvent, EventId};
pub use filter::EventFilter;
pub use kind::{EventKind, EventTypeResolver};
pub use payload::{
    CafeCreated, CoffeeClubEvent, CoffeeOrderCreated, CoffeeOrderUpdated, MoveVariant,
    PayloadError,
};
