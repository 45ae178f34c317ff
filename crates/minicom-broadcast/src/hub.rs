use std::sync::Arc;

use minicom_types::BroadcastPayload;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::bus::{MessageBus, PayloadStream};

#[derive(Debug, Clone)]
struct Envelope {
    origin: Uuid,
    payload: BroadcastPayload,
}

/// One broadcast scope shared by every instance that connects to it.
///
/// Backed by `tokio::sync::broadcast`; cloning shares the channel.
#[derive(Clone)]
pub struct BroadcastHub {
    name: Arc<str>,
    sender: broadcast::Sender<Envelope>,
}

impl BroadcastHub {
    /// Create a hub buffering up to `capacity` payloads per subscriber.
    ///
    /// A zero capacity is raised to 1; tokio refuses empty channels.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let name = name.into();
        if capacity == 0 {
            tracing::warn!(hub = %name, "broadcast capacity 0 raised to 1");
        }
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: Arc::from(name),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect a new instance to this hub
    pub fn channel(&self) -> HubChannel {
        let instance_id = Uuid::new_v4();
        tracing::debug!(hub = %self.name, %instance_id, "instance connected");
        HubChannel {
            instance_id,
            hub: self.clone(),
        }
    }

    /// Number of live subscriptions across all instances
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("name", &self.name)
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

/// An instance's endpoint on a [`BroadcastHub`]
#[derive(Debug, Clone)]
pub struct HubChannel {
    instance_id: Uuid,
    hub: BroadcastHub,
}

impl MessageBus for HubChannel {
    fn publish(&self, payload: BroadcastPayload) {
        tracing::trace!(
            hub = %self.hub.name,
            kind = payload.kind(),
            thread_id = payload.thread_id(),
            "publish"
        );
        // No subscribers means nobody else is listening; dropping is fine.
        let _ = self.hub.sender.send(Envelope {
            origin: self.instance_id,
            payload,
        });
    }

    fn subscribe(&self) -> PayloadStream {
        let mut rx = self.hub.sender.subscribe();
        let me = self.instance_id;
        let hub = self.hub.name.clone();

        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(envelope) if envelope.origin == me => continue,
                    Ok(envelope) => yield envelope.payload,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(%hub, skipped, "subscriber lagged, payloads dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use minicom_types::{ReadReceipt, SenderId, TypingPayload};
    use tokio_test::{assert_pending, task};

    fn typing(thread_id: &str, is_typing: bool) -> BroadcastPayload {
        BroadcastPayload::Typing(TypingPayload {
            thread_id: thread_id.to_string(),
            sender_id: SenderId::Visitor,
            is_typing,
        })
    }

    #[tokio::test]
    async fn test_other_instances_receive_publish() {
        let hub = BroadcastHub::new("test", 16);
        let tab_a = hub.channel();
        let tab_b = hub.channel();
        let mut b_sub = tab_b.subscribe();

        tab_a.publish(typing("t1", true));

        assert_eq!(b_sub.next().await, Some(typing("t1", true)));
    }

    #[tokio::test]
    async fn test_publisher_does_not_receive_its_own_payload() {
        let hub = BroadcastHub::new("test", 16);
        let tab_a = hub.channel();
        let mut own = task::spawn(tab_a.subscribe());

        tab_a.publish(typing("t1", true));

        assert_pending!(own.poll_next());
    }

    #[tokio::test]
    async fn test_payloads_from_one_sender_stay_in_order() {
        let hub = BroadcastHub::new("test", 16);
        let tab_a = hub.channel();
        let tab_b = hub.channel();
        let mut b_sub = tab_b.subscribe();

        tab_a.publish(typing("t1", true));
        tab_a.publish(BroadcastPayload::ReadReceipt(ReadReceipt {
            thread_id: "t1".to_string(),
            read_at: 10,
        }));
        tab_a.publish(typing("t1", false));

        let kinds: Vec<_> = b_sub.by_ref().take(3).map(|p| p.kind()).collect().await;
        assert_eq!(kinds, vec!["typing", "read_receipt", "typing"]);
    }

    #[tokio::test]
    async fn test_separate_hubs_are_isolated() {
        let left = BroadcastHub::new("left", 16);
        let right = BroadcastHub::new("right", 16);
        let mut right_sub = task::spawn(right.channel().subscribe());

        left.channel().publish(typing("t", true));

        assert_pending!(right_sub.poll_next());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let hub = BroadcastHub::new("small", 2);
        let publisher = hub.channel();
        let mut sub = hub.channel().subscribe();

        for i in 0..5 {
            publisher.publish(typing(&format!("t{}", i), true));
        }

        // The oldest payloads were overwritten; the newest still arrive.
        assert_eq!(sub.next().await, Some(typing("t3", true)));
        assert_eq!(sub.next().await, Some(typing("t4", true)));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let hub = BroadcastHub::new("empty", 4);
        hub.channel().publish(typing("t", false));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_hub_still_delivers() {
        let hub = BroadcastHub::new("tiny", 0);
        let tab_a = hub.channel();
        let tab_b = hub.channel();
        let mut sub = tab_b.subscribe();

        tab_a.publish(typing("t", true));
        assert_eq!(sub.next().await, Some(typing("t", true)));
    }
}
