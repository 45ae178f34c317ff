use thiserror::Error;

/// Why a send was not confirmed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("network is offline")]
    Offline,
}
