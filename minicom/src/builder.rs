//! High-level builder API for wiring chat instances together

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::broadcast::{BroadcastHub, HubRegistry};
use crate::chat::{ChatSession, NetworkStatus};
use crate::persist::{FileStore, KeyValueStore, MemoryStore, StorageAdapter};
use crate::types::ChatConfig;

/// Builder for a [`ChatApp`]
///
/// # Example
///
/// ```rust,no_run
/// use minicom::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let app = ChatAppBuilder::new()
///     .directory("/var/lib/minicom")
///     .config(ChatConfig::new().with_channel_name("support"))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatAppBuilder {
    directory: Option<PathBuf>,
    config: ChatConfig,
    registry: Option<HubRegistry>,
    network: Option<NetworkStatus>,
}

impl Default for ChatAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatAppBuilder {
    /// In-memory storage, default timings
    pub fn new() -> Self {
        Self {
            directory: None,
            config: ChatConfig::default(),
            registry: None,
            network: None,
        }
    }

    /// Persist threads as files under `dir`
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Look up the hub in an existing registry instead of a private one
    pub fn registry(mut self, registry: HubRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn network(mut self, network: NetworkStatus) -> Self {
        self.network = Some(network);
        self
    }

    pub async fn build(self) -> Result<ChatApp> {
        let durable: Arc<dyn KeyValueStore> = match &self.directory {
            Some(dir) => Arc::new(
                FileStore::open(dir)
                    .await
                    .with_context(|| format!("Failed to open storage at {}", dir.display()))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };

        let registry = self
            .registry
            .unwrap_or_else(|| HubRegistry::new(self.config.broadcast_capacity));
        let hub = registry.hub(&self.config.channel_name).await;

        tracing::debug!(channel = %hub.name(), "chat app ready");

        Ok(ChatApp {
            hub,
            durable,
            network: self.network.unwrap_or_default(),
            config: self.config,
        })
    }
}

/// One application scope: a shared durable store, hub and network flag.
/// Every [`ChatApp::connect`] call yields a new instance.
#[derive(Clone)]
pub struct ChatApp {
    hub: BroadcastHub,
    durable: Arc<dyn KeyValueStore>,
    network: NetworkStatus,
    config: ChatConfig,
}

impl ChatApp {
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    /// Start a new instance with its own session entries
    pub async fn connect(&self) -> Result<ChatSession> {
        let storage = StorageAdapter::new(self.durable.clone(), Arc::new(MemoryStore::new()));
        ChatSession::builder()
            .storage(storage)
            .bus(Arc::new(self.hub.channel()))
            .network(self.network.clone())
            .config(self.config.clone())
            .build()
            .await
    }
}
