use std::time::Duration;

use tokio::time::sleep;

use crate::error::DeliveryError;
use crate::network::NetworkStatus;

/// Stand-in for a transport acknowledgement.
///
/// Waits a fixed delay, then succeeds only if the network is online at that
/// moment.
#[derive(Clone, Debug)]
pub struct SimulatedDelivery {
    delay: Duration,
    network: NetworkStatus,
}

impl SimulatedDelivery {
    pub fn new(delay: Duration, network: NetworkStatus) -> Self {
        Self { delay, network }
    }

    pub async fn confirm(&self) -> Result<(), DeliveryError> {
        sleep(self.delay).await;
        if self.network.is_online() {
            Ok(())
        } else {
            Err(DeliveryError::Offline)
        }
    }
}
