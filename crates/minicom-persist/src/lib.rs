pub mod builder;
pub mod client;
pub mod error;
pub mod stores;
pub mod trait_client;

pub use builder::StorageAdapterBuilder;
pub use client::{
    StorageAdapter, ThreadMap, STORAGE_KEY_ACTIVE_THREAD, STORAGE_KEY_THREADS,
    STORAGE_KEY_VISITOR_THREAD_ID,
};
pub use error::{PersistError, Result};
pub use stores::{FileStore, MemoryStore};
pub use trait_client::KeyValueStore;
