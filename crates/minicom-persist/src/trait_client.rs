use async_trait::async_trait;

use crate::error::Result;

/// String key-value storage, the persistence boundary of the chat core
///
/// Implementations may be shared by several instances; writes are
/// last-writer-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}
