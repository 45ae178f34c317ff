use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hub::{BroadcastHub, HubChannel};

/// Named broadcast scopes; instances opening the same name share a hub
#[derive(Clone)]
pub struct HubRegistry {
    hubs: Arc<RwLock<HashMap<String, BroadcastHub>>>,
    capacity: usize,
}

impl HubRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            hubs: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Get the hub for `name`, creating it on first use
    pub async fn hub(&self, name: &str) -> BroadcastHub {
        if let Some(hub) = self.hubs.read().await.get(name) {
            return hub.clone();
        }

        let mut hubs = self.hubs.write().await;
        hubs.entry(name.to_string())
            .or_insert_with(|| BroadcastHub::new(name, self.capacity))
            .clone()
    }

    /// Connect a new instance to the hub named `name`
    pub async fn open(&self, name: &str) -> HubChannel {
        self.hub(name).await.channel()
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.hubs.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for HubRegistry {
    fn default() -> Self {
        Self::new(1024)
    }
}
