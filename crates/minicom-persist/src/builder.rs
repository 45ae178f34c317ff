use std::path::PathBuf;
use std::sync::Arc;

use crate::client::StorageAdapter;
use crate::error::{PersistError, Result};
use crate::stores::{FileStore, MemoryStore};
use crate::trait_client::KeyValueStore;

pub struct StorageAdapterBuilder {
    durable: Option<Arc<dyn KeyValueStore>>,
    directory: Option<PathBuf>,
    session: Option<Arc<dyn KeyValueStore>>,
}

impl StorageAdapterBuilder {
    pub fn new() -> Self {
        Self {
            durable: None,
            directory: None,
            session: None,
        }
    }

    /// Use an existing store for durable entries
    pub fn durable(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.durable = Some(store);
        self
    }

    /// Keep durable entries in files under `dir`
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// Store for session-scoped entries (defaults to memory)
    pub fn session(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.session = Some(store);
        self
    }

    pub async fn build(self) -> Result<StorageAdapter> {
        let durable: Arc<dyn KeyValueStore> = match (self.durable, self.directory) {
            (Some(store), None) => store,
            (None, Some(dir)) => Arc::new(FileStore::open(dir).await?),
            (Some(_), Some(_)) => {
                return Err(PersistError::Internal(
                    "set either a durable store or a directory, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(PersistError::Internal(
                    "a durable store or directory is required".to_string(),
                ))
            }
        };
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        Ok(StorageAdapter::new(durable, session))
    }
}

impl Default for StorageAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
