//! Storage backends for the Parley chat core.
//!
//! Implements the core's [`parley_core::storage::KeyValueStore`] contract:
//!
//! - [`MemoryKeyValueStore`]: process-lifetime map, for tests and hosts
//!   without a storage bridge
//! - [`JsonFileStore`]: single-file JSON store for desktop embeddings

pub mod json_file_store;
pub mod memory_store;

pub use crate::json_file_store::JsonFileStore;
pub use crate::memory_store::MemoryKeyValueStore;
