use futures::Stream;
use minicom_types::BroadcastPayload;
use std::pin::Pin;

pub type PayloadStream = Pin<Box<dyn Stream<Item = BroadcastPayload> + Send>>;

/// Publish/subscribe channel between instances of the chat core.
///
/// An instance never receives its own publishes. Payloads from one publisher
/// arrive in the order they were published.
pub trait MessageBus: Send + Sync {
    /// Fan a payload out to every other subscribed instance
    fn publish(&self, payload: BroadcastPayload);

    /// Stream of payloads published by other instances from now on
    fn subscribe(&self) -> PayloadStream;
}
