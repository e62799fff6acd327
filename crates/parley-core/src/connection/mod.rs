//! Connection health module.
//!
//! - `manager`: the connection state machine ([`ConnectionManager`])
//! - `policy`: reconnect timing ([`ReconnectPolicy`])

mod manager;
mod policy;

pub use manager::ConnectionManager;
pub use policy::{DEFAULT_RECONNECT_DELAY, ReconnectPolicy};
