//! Physical coffee machine actuation.
//!
//! [`Actuator`] is the narrow capability the order pipeline calls to brew.
//! [`ProcessActuator`] shells out to the device-controller executable;
//! tests substitute a recorder.

pub mod process;
pub mod serialized;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use coffeeclub_core::CoffeeType;

pub use process::ProcessActuator;
pub use serialized::SerializedActuator;

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("controller executable not found at {0}")]
    ExecutableNotFound(PathBuf),
    #[error("failed to launch controller: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("controller did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("controller failed (exit {status:?}): {stderr}")]
    Failed { status: Option<i32>, stderr: String },
}

/// Captured controller output of a successful brew.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrewReport {
    pub stdout: String,
}

#[async_trait]
pub trait Actuator: Send + Sync {
    /// Brew `coffee` on the machine at `device_address`.
    async fn brew(
        &self,
        device_address: &str,
        coffee: CoffeeType,
    ) -> Result<BrewReport, ActuatorError>;
}
