//! Infrastructure layer: chain client, stores, event handlers, device
//! actuation and the polling workers that tie them together.

pub mod actuator;
pub mod chain;
pub mod config;
pub mod db;
pub mod indexer;
pub mod projections;
pub mod read_model;
pub mod workers;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub(crate) mod test_support;
