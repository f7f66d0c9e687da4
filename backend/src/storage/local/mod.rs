//! # Local Storage Module
//!
//! Non-authoritative storage local to this process: one JSON collection per
//! entity type, kept in an injected key-value backend.

pub mod backend;
pub mod store;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use store::{LocalStore, LOCAL_KEY_PREFIX};
