//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably by the repositories.
//!
//! Every entity type (children, events, tasks, documents, notes) goes
//! through the same [`EntityStore`] trait. What differs between them is
//! captured by [`Entity`]: the collection name, how a record is built from
//! a creation request, how a partial update is merged, and how listings
//! are ordered.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Ordering;

/// Errors surfaced by a backing store
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached, read or written
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },
}

impl StoreError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }

    pub fn not_found(collection: &'static str, id: &str) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A record type managed by the persistence layer
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Creation input, carries the owning user id
    type Draft: Send + 'static;
    /// Partial update input. Never carries a user id.
    type Patch: Clone + Send + Sync + 'static;

    /// Collection name, used as table name and local storage key suffix
    const COLLECTION: &'static str;
    /// Prefix of generated ids, e.g. "child"
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Build a new record. Unset optional fields end up as `None`.
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Merge a partial update onto this record. Does not touch timestamps.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Listing order returned by `get_all`. Newest first unless overridden.
    fn listing_order(a: &Self, b: &Self) -> Ordering {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(a.id()))
    }

    /// Refresh `updated_at`, keeping it strictly increasing for this record
    fn touch(&mut self, now: DateTime<Utc>) {
        let now = now.trunc_subsecs(6);
        let previous = self.updated_at();
        let stamp = if now > previous {
            now
        } else {
            previous + Duration::microseconds(1)
        };
        self.set_updated_at(stamp);
    }
}

/// Entities that may reference a child through an optional `childId`
pub trait ChildLinked: Entity {
    fn child_id(&self) -> Option<&str>;

    /// A patch that clears the child reference
    fn unlink_child_patch() -> Self::Patch;
}

/// Trait defining the interface for one backing store of one entity type
///
/// Each call is a single read-modify-write against this store; there is no
/// transaction spanning calls.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Short name used in log lines ("sqlite", "local", ...)
    fn name(&self) -> &'static str;

    /// All records owned by `user_id`, in `E::listing_order`
    async fn list(&self, user_id: &str) -> StoreResult<Vec<E>>;

    /// Retrieve a specific record by id
    async fn get(&self, id: &str) -> StoreResult<Option<E>>;

    /// Store a new record
    async fn insert(&self, record: &E) -> StoreResult<()>;

    /// Merge `patch` onto the record with this id, stamp it with `at` and
    /// persist it. Fails with `NotFound` if this store has no such record.
    async fn modify(&self, id: &str, patch: E::Patch, at: DateTime<Utc>) -> StoreResult<E>;

    /// Remove a record. Returns true if a record was found and removed.
    async fn remove(&self, id: &str) -> StoreResult<bool>;
}
