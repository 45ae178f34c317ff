use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use minicom_broadcast::MessageBus;
use minicom_persist::ThreadMap;
use minicom_store::ThreadStore;
use minicom_types::{
    now_millis, BroadcastPayload, ChatConfig, Message, MessageStatus, ReadReceipt, SenderId,
    Thread, TypingPayload,
};

use crate::builder::ChatSessionBuilder;
use crate::debounce::Debouncer;
use crate::delivery::SimulatedDelivery;
use crate::network::NetworkStatus;
use crate::pending::PendingSend;

/// thread id -> who is typing there, if anyone
pub type TypingMap = HashMap<String, Option<SenderId>>;

struct SessionInner {
    store: ThreadStore,
    bus: Arc<dyn MessageBus>,
    network: NetworkStatus,
    delivery: SimulatedDelivery,
    config: ChatConfig,
    typing: watch::Sender<TypingMap>,
    typing_timers: Debouncer<String>,
    listener: OnceLock<AbortHandle>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.get() {
            listener.abort();
        }
    }
}

/// One chat instance: a thread store kept in sync with its peers over a
/// [`MessageBus`].
///
/// Cloning is cheap and shares everything. The inbound listener stops when
/// [`ChatSession::shutdown`] is called or the last handle is dropped.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

impl ChatSession {
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::new()
    }

    /// Wire up a session around an already loaded store and start listening.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn start(
        store: ThreadStore,
        bus: Arc<dyn MessageBus>,
        network: NetworkStatus,
        config: ChatConfig,
    ) -> Self {
        let (typing, _) = watch::channel(TypingMap::new());
        let inner = Arc::new(SessionInner {
            store,
            bus,
            delivery: SimulatedDelivery::new(config.send_delay, network.clone()),
            network,
            typing_timers: Debouncer::new(config.typing_debounce),
            config,
            typing,
            listener: OnceLock::new(),
        });

        let listener = spawn_listener(&inner);
        let _ = inner.listener.set(listener);
        Self { inner }
    }

    pub fn store(&self) -> &ThreadStore {
        &self.inner.store
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.inner.network
    }

    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    // ---- sending ----

    /// Insert an outgoing message and start confirming it.
    ///
    /// Visitors write to their own thread, agents to the active thread.
    /// Returns `None` for blank text or when there is no thread to write to.
    pub async fn begin_send(&self, text: &str, sender: SenderId) -> Option<PendingSend> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let thread_id = match sender {
            SenderId::Visitor => self.inner.store.visitor_thread_id().await,
            SenderId::Agent => self.inner.store.active_thread_id().await,
        };
        let Some(thread_id) = thread_id else {
            debug!(sender = %sender, "no target thread, dropping message");
            return None;
        };

        Some(self.dispatch(Message::outgoing(thread_id, sender, text)).await)
    }

    /// Send and wait for the outcome
    pub async fn send_message(&self, text: &str, sender: SenderId) -> Option<Message> {
        self.begin_send(text, sender).await?.confirmed().await
    }

    /// Resend a failed message under a new id.
    ///
    /// Only messages currently in `error` can be retried.
    pub async fn begin_retry(&self, message_id: &str) -> Option<PendingSend> {
        let found = self.inner.store.get_message(message_id).await?;
        if found.message.status != MessageStatus::Error {
            debug!(message_id, status = ?found.message.status, "retry ignored");
            return None;
        }
        Some(self.dispatch(found.message.resend()).await)
    }

    pub async fn retry_message(&self, message_id: &str) -> Option<Message> {
        self.begin_retry(message_id).await?.confirmed().await
    }

    async fn dispatch(&self, message: Message) -> PendingSend {
        self.inner.store.add_message(message.clone()).await;

        let store = self.inner.store.clone();
        let bus = self.inner.bus.clone();
        let delivery = self.inner.delivery.clone();
        let outgoing = message.clone();

        let confirmation = tokio::spawn(async move {
            match delivery.confirm().await {
                Ok(()) => {
                    let sent = outgoing.with_status(MessageStatus::Sent);
                    store
                        .set_message_status(&sent.thread_id, &sent.id, MessageStatus::Sent)
                        .await;
                    bus.publish(BroadcastPayload::Message(sent.clone()));
                    debug!(message_id = %sent.id, thread_id = %sent.thread_id, "message sent");
                    sent
                }
                Err(e) => {
                    warn!(message_id = %outgoing.id, "send failed: {}", e);
                    store
                        .set_message_status(&outgoing.thread_id, &outgoing.id, MessageStatus::Error)
                        .await;
                    outgoing.with_status(MessageStatus::Error)
                }
            }
        });

        PendingSend::new(message, confirmation)
    }

    // ---- read receipts ----

    /// Stamp every visitor message in the thread as read and tell the peers
    pub async fn mark_thread_read(&self, thread_id: &str) {
        let read_at = now_millis();
        self.inner.store.set_thread_read_at(thread_id, read_at).await;
        self.inner.bus.publish(BroadcastPayload::ReadReceipt(ReadReceipt {
            thread_id: thread_id.to_string(),
            read_at,
        }));
    }

    // ---- typing ----

    /// Report a keystroke (`true`) or an explicit stop (`false`).
    ///
    /// While typing, the indicator clears itself after the debounce window
    /// unless refreshed.
    pub async fn set_typing(&self, thread_id: &str, is_typing: bool, sender: SenderId) {
        self.apply_typing(thread_id, is_typing.then_some(sender));
        self.publish_typing(thread_id, is_typing, sender);

        if is_typing {
            let weak = Arc::downgrade(&self.inner);
            let key = thread_id.to_string();
            self.inner
                .typing_timers
                .arm(key.clone(), async move {
                    if let Some(inner) = weak.upgrade() {
                        ChatSession { inner }.expire_typing(&key, sender);
                    }
                })
                .await;
        } else {
            self.inner.typing_timers.cancel(&thread_id.to_string()).await;
        }
    }

    /// Input lost focus: stop typing now
    pub async fn blur(&self, thread_id: &str, sender: SenderId) {
        self.set_typing(thread_id, false, sender).await;
    }

    pub fn typing_by_thread(&self) -> TypingMap {
        self.inner.typing.borrow().clone()
    }

    pub fn typing_in(&self, thread_id: &str) -> Option<SenderId> {
        self.inner.typing.borrow().get(thread_id).copied().flatten()
    }

    pub fn typing_changes(&self) -> watch::Receiver<TypingMap> {
        self.inner.typing.subscribe()
    }

    fn apply_typing(&self, thread_id: &str, typist: Option<SenderId>) {
        self.inner.typing.send_if_modified(|map| {
            let previous = map.insert(thread_id.to_string(), typist);
            previous != Some(typist)
        });
    }

    fn expire_typing(&self, thread_id: &str, sender: SenderId) {
        // someone else may have started typing since
        self.inner.typing.send_if_modified(|map| match map.get_mut(thread_id) {
            Some(typist) if *typist == Some(sender) => {
                *typist = None;
                true
            }
            _ => false,
        });
        self.publish_typing(thread_id, false, sender);
    }

    fn publish_typing(&self, thread_id: &str, is_typing: bool, sender: SenderId) {
        self.inner.bus.publish(BroadcastPayload::Typing(TypingPayload {
            thread_id: thread_id.to_string(),
            sender_id: sender,
            is_typing,
        }));
    }

    // ---- inbound ----

    /// Apply a payload received from a peer
    pub async fn handle_inbound(&self, payload: BroadcastPayload) {
        debug!(kind = payload.kind(), thread_id = payload.thread_id(), "inbound payload");
        match payload {
            BroadcastPayload::Message(message) => {
                self.inner.store.add_message(message).await;
            }
            BroadcastPayload::Typing(typing) => {
                self.apply_typing(&typing.thread_id, typing.is_typing.then_some(typing.sender_id));
            }
            BroadcastPayload::ReadReceipt(receipt) => {
                self.inner
                    .store
                    .set_thread_read_at(&receipt.thread_id, receipt.read_at)
                    .await;
            }
        }
    }

    /// Stop consuming the bus. Local operations keep working.
    pub fn shutdown(&self) {
        if let Some(listener) = self.inner.listener.get() {
            listener.abort();
            info!("chat session listener stopped");
        }
    }

    // ---- views ----

    pub async fn threads(&self) -> ThreadMap {
        self.inner.store.threads().await
    }

    pub async fn thread_list(&self) -> Vec<Thread> {
        self.inner.store.thread_list().await
    }

    pub async fn active_thread_id(&self) -> Option<String> {
        self.inner.store.active_thread_id().await
    }

    pub async fn set_active_thread_id(&self, thread_id: Option<String>) {
        self.inner.store.set_active_thread_id(thread_id).await;
    }

    pub async fn visitor_thread_id(&self) -> Option<String> {
        self.inner.store.visitor_thread_id().await
    }

    pub async fn unread_total(&self) -> usize {
        self.inner.store.unread_total().await
    }
}

fn spawn_listener(inner: &Arc<SessionInner>) -> AbortHandle {
    // subscribe before returning so nothing published after start is missed
    let mut inbound = inner.bus.subscribe();
    let weak: Weak<SessionInner> = Arc::downgrade(inner);

    let handle = tokio::spawn(async move {
        while let Some(payload) = inbound.next().await {
            let Some(inner) = weak.upgrade() else {
                break;
            };
            ChatSession { inner }.handle_inbound(payload).await;
        }
        debug!("inbound stream ended");
    });
    handle.abort_handle()
}
