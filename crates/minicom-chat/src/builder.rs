use std::sync::Arc;

use anyhow::{anyhow, Result};

use minicom_broadcast::MessageBus;
use minicom_persist::StorageAdapter;
use minicom_store::{OrderingPolicy, ThreadStore};
use minicom_types::ChatConfig;

use crate::network::NetworkStatus;
use crate::session::ChatSession;

/// Builder for a [`ChatSession`].
///
/// A bus is required, plus either a ready [`ThreadStore`] or a
/// [`StorageAdapter`] to load one from.
pub struct ChatSessionBuilder {
    store: Option<ThreadStore>,
    storage: Option<StorageAdapter>,
    bus: Option<Arc<dyn MessageBus>>,
    network: Option<NetworkStatus>,
    ordering: Option<Arc<dyn OrderingPolicy>>,
    config: ChatConfig,
}

impl ChatSessionBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            storage: None,
            bus: None,
            network: None,
            ordering: None,
            config: ChatConfig::default(),
        }
    }

    /// Use an existing store as-is; it is not reloaded
    pub fn store(mut self, store: ThreadStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Build and load a fresh store over this storage
    pub fn storage(mut self, storage: StorageAdapter) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn bus(mut self, bus: Arc<dyn MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Share a network flag with other sessions. Defaults to a private, online one.
    pub fn network(mut self, network: NetworkStatus) -> Self {
        self.network = Some(network);
        self
    }

    /// Order the inbox with a custom policy instead of unread-then-recent
    pub fn ordering(mut self, ordering: Arc<dyn OrderingPolicy>) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<ChatSession> {
        let bus = self.bus.ok_or_else(|| anyhow!("Message bus is required"))?;

        let store = match (self.store, self.storage) {
            (Some(_), Some(_)) => {
                return Err(anyhow!("Provide either a thread store or a storage adapter, not both"))
            }
            (Some(store), None) => store,
            (None, Some(storage)) => {
                let store = ThreadStore::new(storage).with_preview_length(self.config.preview_length);
                store.load().await;
                store
            }
            (None, None) => return Err(anyhow!("Thread store or storage adapter is required")),
        };
        let store = match self.ordering {
            Some(ordering) => store.with_ordering(ordering),
            None => store,
        };

        Ok(ChatSession::start(
            store,
            bus,
            self.network.unwrap_or_default(),
            self.config,
        ))
    }
}

impl Default for ChatSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
