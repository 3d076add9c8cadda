//! Background workers: one polling loop per tracked event type.

pub mod event_poller;
pub mod tracker;

pub use event_poller::{EventPoller, PollError, PollOutcome, PollerConfig, WorkerHandle};
pub use tracker::{EventTracker, TrackerRegistry};
