use std::sync::Arc;

use anyhow::{Context, Result};

use minicom_broadcast::{BroadcastHub, HubRegistry};
use minicom_chat::{ChatSession, NetworkStatus};
use minicom_persist::{KeyValueStore, MemoryStore, StorageAdapter};
use minicom_types::SenderId;

use crate::config::{Config, StorageBackend};

/// Everything the terminal driver works with.
///
/// The visitor and the agent are two instances on one hub. They share the
/// durable store and the network flag; each keeps its own session entries.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: BroadcastHub,
    pub network: NetworkStatus,
    pub visitor: ChatSession,
    pub agent: ChatSession,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let registry = HubRegistry::new(config.chat.broadcast_capacity);
        let hub = registry.hub(&config.chat.channel_name).await;
        let network = NetworkStatus::online();

        let durable: Option<Arc<dyn KeyValueStore>> = match config.storage.backend {
            StorageBackend::Memory => Some(Arc::new(MemoryStore::new())),
            StorageBackend::File => None,
        };

        let mut sessions = Vec::with_capacity(2);
        for role in [SenderId::Visitor, SenderId::Agent] {
            let storage = match &durable {
                Some(durable) => StorageAdapter::new(durable.clone(), Arc::new(MemoryStore::new())),
                None => StorageAdapter::builder()
                    .directory(&config.storage.directory)
                    .build()
                    .await
                    .with_context(|| {
                        format!("Failed to open storage at {}", config.storage.directory)
                    })?,
            };

            let session = ChatSession::builder()
                .storage(storage)
                .bus(Arc::new(registry.open(&config.chat.channel_name).await))
                .network(network.clone())
                .config(config.chat_config())
                .build()
                .await
                .with_context(|| format!("Failed to start {} session", role))?;
            sessions.push(session);
        }
        let agent = sessions.pop().context("agent session missing")?;
        let visitor = sessions.pop().context("visitor session missing")?;

        tracing::info!(
            channel = %hub.name(),
            backend = ?config.storage.backend,
            "chat sessions ready"
        );

        Ok(Self {
            config: Arc::new(config),
            hub,
            network,
            visitor,
            agent,
        })
    }

    pub fn session(&self, role: SenderId) -> &ChatSession {
        match role {
            SenderId::Visitor => &self.visitor,
            SenderId::Agent => &self.agent,
        }
    }

    /// Wipe durable chat data on both sides.
    ///
    /// The shared durable store is cleared once; both stores then keep both
    /// visitor threads so either one's snapshot is complete.
    pub async fn reset(&self) -> Result<()> {
        self.visitor
            .store()
            .storage()
            .clear()
            .await
            .context("Failed to clear chat storage")?;

        let mut keep = Vec::with_capacity(2);
        for session in [&self.visitor, &self.agent] {
            keep.extend(session.visitor_thread_id().await);
        }
        self.visitor.store().reset_keeping(&keep).await;
        self.agent.store().reset_keeping(&keep).await;

        tracing::info!("chat data reset");
        Ok(())
    }

    pub fn shutdown(&self) {
        self.visitor.shutdown();
        self.agent.shutdown();
    }
}
