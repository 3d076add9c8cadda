use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use coffeeclub_core::CoffeeType;

use super::{Actuator, ActuatorError, BrewReport};

/// Runs `<executable> <device-address> <beverage>` and waits for it.
///
/// Success means exit status zero *and* empty stderr; anything the controller
/// writes to stderr is treated as a failed brew. A run that outlives the
/// timeout is killed and reported as [`ActuatorError::TimedOut`].
#[derive(Debug, Clone)]
pub struct ProcessActuator {
    executable: Option<PathBuf>,
    timeout: Duration,
}

impl ProcessActuator {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self {
            executable,
            timeout: Duration::from_millis(crate::config::DEFAULT_BREW_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Executable to run, checked on every call since it may be replaced or
    /// removed while the indexer runs.
    fn resolve(&self) -> Result<&PathBuf, ActuatorError> {
        let path = self
            .executable
            .as_ref()
            .ok_or(ActuatorError::NotConfigured("COFFEE_CONTROLLER_PATH"))?;
        if !path.exists() {
            return Err(ActuatorError::ExecutableNotFound(path.clone()));
        }
        Ok(path)
    }
}

#[async_trait]
impl Actuator for ProcessActuator {
    #[instrument(skip(self), fields(coffee = %coffee))]
    async fn brew(
        &self,
        device_address: &str,
        coffee: CoffeeType,
    ) -> Result<BrewReport, ActuatorError> {
        let executable = self.resolve()?;

        let run = Command::new(executable)
            .arg(device_address)
            .arg(coffee.as_arg())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        // Dropping the timed-out future kills the child.
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ActuatorError::TimedOut(self.timeout))??;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(%stdout, "controller finished");

        if !output.status.success() || !stderr.is_empty() {
            return Err(ActuatorError::Failed {
                status: output.status.code(),
                stderr,
            });
        }
        Ok(BrewReport { stdout })
    }
}
