use std::collections::BTreeMap;
use std::sync::Arc;

use minicom_types::ThreadState;

use crate::builder::StorageAdapterBuilder;
use crate::error::Result;
use crate::stores::MemoryStore;
use crate::trait_client::KeyValueStore;

pub const STORAGE_KEY_THREADS: &str = "threads";
pub const STORAGE_KEY_ACTIVE_THREAD: &str = "activeThreadId";
pub const STORAGE_KEY_VISITOR_THREAD_ID: &str = "visitorThreadId";

pub type ThreadMap = BTreeMap<String, ThreadState>;

/// Reads and writes the chat core's entries.
///
/// The durable store holds the thread snapshot and the active thread id and
/// may be shared by several instances. The session store holds the visitor
/// thread id and belongs to one session only.
#[derive(Clone)]
pub struct StorageAdapter {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl StorageAdapter {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Both stores in memory, nothing survives the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn builder() -> StorageAdapterBuilder {
        StorageAdapterBuilder::new()
    }

    pub fn durable(&self) -> &Arc<dyn KeyValueStore> {
        &self.durable
    }

    /// Load the thread snapshot.
    ///
    /// A missing, unreadable or unparseable snapshot yields an empty map.
    pub async fn load_threads(&self) -> ThreadMap {
        let raw = match self.durable.get(STORAGE_KEY_THREADS).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return ThreadMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read thread snapshot: {}", e);
                return ThreadMap::new();
            }
        };

        match serde_json::from_str::<ThreadMap>(&raw) {
            Ok(threads) => threads,
            Err(e) => {
                tracing::warn!("Discarding malformed thread snapshot: {}", e);
                ThreadMap::new()
            }
        }
    }

    pub async fn save_threads(&self, threads: &ThreadMap) -> Result<()> {
        let raw = serde_json::to_string(threads)?;
        self.durable.set(STORAGE_KEY_THREADS, raw).await
    }

    pub async fn load_active_thread_id(&self) -> Option<String> {
        match self.durable.get(STORAGE_KEY_ACTIVE_THREAD).await {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read active thread id: {}", e);
                None
            }
        }
    }

    pub async fn save_active_thread_id(&self, thread_id: &str) -> Result<()> {
        self.durable
            .set(STORAGE_KEY_ACTIVE_THREAD, thread_id.to_string())
            .await
    }

    /// Visitor thread id for this session, minted on first use
    pub async fn visitor_thread_id(&self) -> Result<String> {
        if let Some(id) = self.session.get(STORAGE_KEY_VISITOR_THREAD_ID).await? {
            if !id.is_empty() {
                return Ok(id);
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.session
            .set(STORAGE_KEY_VISITOR_THREAD_ID, id.clone())
            .await?;
        tracing::debug!(visitor_thread_id = %id, "minted visitor thread id");
        Ok(id)
    }

    /// Remove the durable entries. The session's visitor id is kept.
    pub async fn clear(&self) -> Result<()> {
        self.durable.remove(STORAGE_KEY_THREADS).await?;
        self.durable.remove(STORAGE_KEY_ACTIVE_THREAD).await?;
        Ok(())
    }
}
