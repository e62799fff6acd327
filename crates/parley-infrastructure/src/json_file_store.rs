//! JSON-file key/value backend.
//!
//! Persists all blobs as one JSON object in a single file under a
//! caller-supplied directory. Desktop embeddings use this where the web
//! build would use browser local storage. The session core treats
//! persistence as best-effort, so this backend favors tolerance over
//! strictness: a corrupt store file is logged and treated as empty rather
//! than poisoning every subsequent operation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parley_core::error::Result;
use parley_core::storage::KeyValueStore;
use tracing::warn;

/// File name used inside the store directory.
const STORE_FILE: &str = "parley_store.json";

/// A `KeyValueStore` backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory and file are created
    /// lazily on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
        }
    }

    /// Path of the underlying store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<HashMap<String, String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt store file, treating as empty");
                Ok(HashMap::new())
            }
        }
    }

    async fn write_entries(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}
