//! Key/value persistence contract.
//!
//! The core persists string-keyed JSON blobs and requires no transactional
//! guarantees from the backend (browser local storage, an in-memory map, a
//! JSON file — anything with get/set/remove).

use async_trait::async_trait;

use crate::error::Result;

/// An abstract string-keyed blob store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: blob found
    /// - `Ok(None)`: nothing stored under the key
    /// - `Err(_)`: backend failure
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous blob.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the blob stored under `key`, if any.
    async fn remove(&self, key: &str) -> Result<()>;
}
