use async_trait::async_trait;
use tokio::sync::Mutex;

use coffeeclub_core::CoffeeType;

use super::{Actuator, ActuatorError, BrewReport};

/// Allows at most one brew in flight across all trackers.
///
/// Opt-in (`SERIALIZE_BREWS`); without it, concurrent `* -> Processing`
/// transitions may launch overlapping controller processes.
pub struct SerializedActuator<A> {
    inner: A,
    lock: Mutex<()>,
}

impl<A> SerializedActuator<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<A: Actuator> Actuator for SerializedActuator<A> {
    async fn brew(
        &self,
        device_address: &str,
        coffee: CoffeeType,
    ) -> Result<BrewReport, ActuatorError> {
        let _guard = self.lock.lock().await;
        self.inner.brew(device_address, coffee).await
    }
}
