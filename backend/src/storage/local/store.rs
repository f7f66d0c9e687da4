use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::backend::KeyValueBackend;
use crate::storage::traits::{Entity, EntityStore, StoreError, StoreResult};

/// Prefix of every key the local store writes
pub const LOCAL_KEY_PREFIX: &str = "parent_concierge";

/// Local store that keeps one serialized collection per entity type
///
/// The whole collection is read and rewritten on every mutation. Writes are
/// serialized through an async mutex so concurrent requests cannot lose each
/// other's changes.
pub struct LocalStore<E> {
    backend: Arc<dyn KeyValueBackend>,
    key: String,
    write_lock: Arc<Mutex<()>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for LocalStore<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            key: self.key.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> LocalStore<E> {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            key: Self::storage_key(),
            write_lock: Arc::new(Mutex::new(())),
            _entity: PhantomData,
        }
    }

    /// Stable key for this entity type, e.g. "parent_concierge.children"
    pub fn storage_key() -> String {
        format!("{}.{}", LOCAL_KEY_PREFIX, E::COLLECTION)
    }

    fn load(&self) -> StoreResult<Vec<E>> {
        let raw = self.backend.read(&self.key).map_err(StoreError::unavailable)?;

        match raw {
            None => Ok(Vec::new()),
            Some(text) if text.trim().is_empty() => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text).map_err(|e| {
                warn!("Local collection {} could not be parsed: {}", self.key, e);
                StoreError::Unavailable(format!("corrupt local collection {}: {}", self.key, e))
            }),
        }
    }

    fn save(&self, records: &[E]) -> StoreResult<()> {
        let text = serde_json::to_string(records).map_err(StoreError::unavailable)?;
        self.backend.write(&self.key, &text).map_err(StoreError::unavailable)?;
        debug!("Saved {} records under {}", records.len(), self.key);
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for LocalStore<E> {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self, user_id: &str) -> StoreResult<Vec<E>> {
        let mut records: Vec<E> = self
            .load()?
            .into_iter()
            .filter(|r| r.user_id() == user_id)
            .collect();
        records.sort_by(E::listing_order);
        Ok(records)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<E>> {
        Ok(self.load()?.into_iter().find(|r| r.id() == id))
    }

    async fn insert(&self, record: &E) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;
        records.push(record.clone());
        self.save(&records)
    }

    async fn modify(&self, id: &str, patch: E::Patch, at: DateTime<Utc>) -> StoreResult<E> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;

        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;
        record.apply_patch(patch);
        record.touch(at);
        let updated = record.clone();

        self.save(&records)?;
        Ok(updated)
    }

    async fn remove(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id() != id);

        if records.len() == before {
            debug!("Nothing to remove for {} in {}", id, self.key);
            return Ok(false);
        }

        self.save(&records)?;
        Ok(true)
    }
}
