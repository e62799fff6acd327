//! Conversation lifecycle module.

mod controller;

#[cfg(test)]
mod controller_test;

pub use controller::{ChatSessionController, ChatViewModel};
