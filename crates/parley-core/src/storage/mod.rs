//! Storage module.
//!
//! - `kv`: the abstract key/value backend contract
//! - `keys`: storage key constants
//! - `session_store`: best-effort persistence for widget state

pub mod keys;
mod kv;
mod session_store;

pub use kv::KeyValueStore;
pub use session_store::SessionStore;
