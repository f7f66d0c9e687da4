//! # SQLite Storage Module
//!
//! The authoritative, structured store. One table per entity type, reached
//! through a sqlx connection pool.

pub mod connection;
pub mod records;
pub mod store;

pub use connection::DbConnection;
pub use records::{format_timestamp, SqlRecord, SqlValue};
pub use store::SqliteStore;
