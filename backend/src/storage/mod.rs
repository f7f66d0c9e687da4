//! # Storage Layer
//!
//! Persistence for the five entity types. Each repository is an
//! [`EntityRepository`] over one [`EntityStore`]:
//!
//! - **sqlite**: the structured, authoritative store
//! - **local**: one JSON collection per entity type in a key-value backend
//! - **fallback**: sqlite first, switching the whole session to the local
//!   store as soon as sqlite becomes unavailable
//!
//! Which of these is used is chosen by the [`StoragePolicy`].

pub mod fallback;
pub mod local;
pub mod repository;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use fallback::{FallbackStore, StorageMode};
pub use local::{FileBackend, KeyValueBackend, LocalStore, MemoryBackend};
pub use repository::EntityRepository;
pub use sqlite::{DbConnection, SqlRecord, SqliteStore};
pub use traits::{ChildLinked, Entity, EntityStore, StoreError, StoreResult};

use shared::{Child, Document, Event, Note, Task};

/// Which backing stores the repositories use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoragePolicy {
    /// SQL database only
    Remote,
    /// Local key-value store only
    Local,
    /// SQL database, falling back to the local store
    #[default]
    Fallback,
}

impl StoragePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoragePolicy::Remote => "remote",
            StoragePolicy::Local => "local",
            StoragePolicy::Fallback => "fallback",
        }
    }
}

impl fmt::Display for StoragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoragePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "sqlite" => Ok(StoragePolicy::Remote),
            "local" => Ok(StoragePolicy::Local),
            "fallback" => Ok(StoragePolicy::Fallback),
            other => Err(anyhow!(
                "Invalid storage policy '{}', expected remote, local or fallback",
                other
            )),
        }
    }
}

/// The repositories of one process, all sharing one [`StorageMode`]
#[derive(Clone)]
pub struct Storage {
    pub children: EntityRepository<Child>,
    pub events: EntityRepository<Event>,
    pub tasks: EntityRepository<Task>,
    pub documents: EntityRepository<Document>,
    pub notes: EntityRepository<Note>,
    pub mode: StorageMode,
    pub policy: StoragePolicy,
}

impl Storage {
    /// Build the repositories for `policy`
    ///
    /// `db` is the structured store, `None` when it could not be opened.
    /// Under the fallback policy a missing database starts the session in
    /// local-only mode; under the remote policy it is an error.
    pub fn build(
        policy: StoragePolicy,
        db: Option<DbConnection>,
        local: Arc<dyn KeyValueBackend>,
    ) -> Result<Self> {
        let mode = match (policy, &db) {
            (StoragePolicy::Local, _) => StorageMode::local_only(),
            (StoragePolicy::Fallback, None) => {
                warn!("Database unavailable at startup, using local storage for this session");
                StorageMode::local_only()
            }
            (StoragePolicy::Remote, None) => {
                return Err(anyhow!("Remote storage policy requires a database connection"))
            }
            _ => StorageMode::new(),
        };

        info!("Building storage with policy {}", policy);

        Ok(Self {
            children: build_repository(policy, db.as_ref(), &local, &mode),
            events: build_repository(policy, db.as_ref(), &local, &mode),
            tasks: build_repository(policy, db.as_ref(), &local, &mode),
            documents: build_repository(policy, db.as_ref(), &local, &mode),
            notes: build_repository(policy, db.as_ref(), &local, &mode),
            mode,
            policy,
        })
    }
}

fn build_repository<E: SqlRecord>(
    policy: StoragePolicy,
    db: Option<&DbConnection>,
    local: &Arc<dyn KeyValueBackend>,
    mode: &StorageMode,
) -> EntityRepository<E> {
    let local_store: Arc<dyn EntityStore<E>> = Arc::new(LocalStore::<E>::new(Arc::clone(local)));

    let store: Arc<dyn EntityStore<E>> = match (policy, db) {
        (StoragePolicy::Remote, Some(db)) => Arc::new(SqliteStore::<E>::new(db.clone())),
        (StoragePolicy::Fallback, Some(db)) => Arc::new(FallbackStore::new(
            Arc::new(SqliteStore::<E>::new(db.clone())),
            local_store,
            mode.clone(),
        )),
        _ => local_store,
    };

    EntityRepository::new(store)
}
