//! Key-value store adapters.
//!
//! A store is an asynchronous, string-keyed, string-valued persistence backend.
//! It knows nothing about namespacing, JSON or caching; those live in
//! [`crate::storage::StorageService`].
//!
//! Every operation may fail with [`Error::StorageUnavailable`](crate::error::Error)
//! when the device storage is absent or full. Callers treat that as non-fatal.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Returns `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key in the store, including keys written by others.
    async fn clear(&self) -> Result<()>;

    /// List every key in the store.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Read several keys, preserving request order.
    async fn multi_get(&self, keys: &[String]) -> Result<Vec<(String, Option<String>)>> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push((key.clone(), self.get(key).await?));
        }
        Ok(out)
    }

    /// Write several entries.
    async fn multi_set(&self, entries: &[(String, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Remove several keys.
    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
