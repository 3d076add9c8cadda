//! Domain building blocks for the coffee club indexer.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! chain identifiers, the order state machine and the projection records the
//! indexer maintains.

pub mod cafe;
pub mod error;
pub mod id;
pub mod order;

pub use cafe::Cafe;
pub use error::{DomainError, DomainResult};
pub use id::{ObjectId, SuiAddress};
pub use order::{CoffeeOrder, CoffeeType, OrderStatus, StatusTransition};
