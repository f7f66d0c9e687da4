//! # Remote Store with Local Fallback
//!
//! [`FallbackStore`] sends every call to the remote store first. When the
//! remote store reports [`StoreError::Unavailable`], the same call is
//! repeated against the local store and the shared [`StorageMode`] is
//! switched to local-only. From then on every store sharing that mode skips
//! the remote store for the rest of the process. There is no automatic
//! switch back and no reconciliation of the two stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::traits::{Entity, EntityStore, StoreError, StoreResult};
use shared::StorageModeKind;

/// Session-scoped storage mode, shared by all repositories of one process
#[derive(Clone, Default)]
pub struct StorageMode {
    local_only: Arc<AtomicBool>,
}

impl StorageMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mode that starts out (and stays) local-only
    pub fn local_only() -> Self {
        Self {
            local_only: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.local_only.load(Ordering::SeqCst)
    }

    /// Switch to local-only. Returns true if this call made the switch.
    pub fn switch_to_local(&self) -> bool {
        !self.local_only.swap(true, Ordering::SeqCst)
    }

    pub fn kind(&self) -> StorageModeKind {
        if self.is_local_only() {
            StorageModeKind::LocalOnly
        } else {
            StorageModeKind::Remote
        }
    }
}

pub struct FallbackStore<E: Entity> {
    remote: Arc<dyn EntityStore<E>>,
    local: Arc<dyn EntityStore<E>>,
    mode: StorageMode,
}

impl<E: Entity> FallbackStore<E> {
    pub fn new(
        remote: Arc<dyn EntityStore<E>>,
        local: Arc<dyn EntityStore<E>>,
        mode: StorageMode,
    ) -> Self {
        Self {
            remote,
            local,
            mode,
        }
    }

    /// Decide whether a remote result should be retried locally
    fn should_fall_back<T>(&self, operation: &str, result: &StoreResult<T>) -> bool {
        match result {
            Err(StoreError::Unavailable(reason)) => {
                warn!(
                    "{} store failed during {} on {}: {}",
                    self.remote.name(),
                    operation,
                    E::COLLECTION,
                    reason
                );
                if self.mode.switch_to_local() {
                    warn!(
                        "Switching to {} storage for the rest of this session",
                        self.local.name()
                    );
                }
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for FallbackStore<E> {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn list(&self, user_id: &str) -> StoreResult<Vec<E>> {
        if !self.mode.is_local_only() {
            let result = self.remote.list(user_id).await;
            if !self.should_fall_back("list", &result) {
                return result;
            }
        }
        debug!("Listing {} from {} store", E::COLLECTION, self.local.name());
        self.local.list(user_id).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<E>> {
        if !self.mode.is_local_only() {
            let result = self.remote.get(id).await;
            if !self.should_fall_back("get", &result) {
                return result;
            }
        }
        self.local.get(id).await
    }

    async fn insert(&self, record: &E) -> StoreResult<()> {
        if !self.mode.is_local_only() {
            let result = self.remote.insert(record).await;
            if !self.should_fall_back("insert", &result) {
                return result;
            }
        }
        self.local.insert(record).await
    }

    async fn modify(&self, id: &str, patch: E::Patch, at: DateTime<Utc>) -> StoreResult<E> {
        if !self.mode.is_local_only() {
            let result = self.remote.modify(id, patch.clone(), at).await;
            if !self.should_fall_back("modify", &result) {
                return result;
            }
        }
        self.local.modify(id, patch, at).await
    }

    async fn remove(&self, id: &str) -> StoreResult<bool> {
        if !self.mode.is_local_only() {
            let result = self.remote.remove(id).await;
            if !self.should_fall_back("remove", &result) {
                return result;
            }
        }
        self.local.remove(id).await
    }
}
