//! # Entity Repository
//!
//! The four persistence operations (`get_all`, `create`, `update`,
//! `delete`) written once and instantiated per entity type. A repository
//! owns id generation and timestamps; the backing [`EntityStore`] only
//! moves records in and out of storage.

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use super::traits::{ChildLinked, Entity, EntityStore, StoreResult};

pub struct EntityRepository<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
}

impl<E: Entity> Clone for EntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<E: Entity> EntityRepository<E> {
    pub fn new(store: Arc<dyn EntityStore<E>>) -> Self {
        Self { store }
    }

    /// Generate an id such as `child::1718000000000a1b2c3d4e`
    pub fn generate_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}::{}{}", E::ID_PREFIX, now.timestamp_millis(), &suffix[..9])
    }

    /// All records owned by `user_id`. Empty when nothing is stored.
    pub async fn get_all(&self, user_id: &str) -> StoreResult<Vec<E>> {
        let records = self.store.list(user_id).await?;
        debug!(
            "Loaded {} {} for user {}",
            records.len(),
            E::COLLECTION,
            user_id
        );
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<E>> {
        self.store.get(id).await
    }

    /// Assign an id, stamp both timestamps and persist the new record
    pub async fn create(&self, draft: E::Draft) -> StoreResult<E> {
        let now = Utc::now().trunc_subsecs(6);
        let record = E::from_draft(Self::generate_id(now), draft, now);

        self.store.insert(&record).await?;
        info!("Created {} record {}", E::COLLECTION, record.id());

        Ok(record)
    }

    /// Merge `patch` onto the stored record and refresh `updated_at`
    pub async fn update(&self, id: &str, patch: E::Patch) -> StoreResult<E> {
        let record = self.store.modify(id, patch, Utc::now()).await?;
        info!("Updated {} record {}", E::COLLECTION, id);
        Ok(record)
    }

    /// Remove a record. Deleting an id that does not exist returns false.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let removed = self.store.remove(id).await?;
        if removed {
            info!("Deleted {} record {}", E::COLLECTION, id);
        } else {
            debug!("No {} record {} to delete", E::COLLECTION, id);
        }
        Ok(removed)
    }
}

impl<E: ChildLinked> EntityRepository<E> {
    /// Clear `child_id` on every record of `user_id` that points at `child_id`.
    /// Returns how many records were changed.
    pub async fn unlink_child(&self, user_id: &str, child_id: &str) -> StoreResult<usize> {
        let linked: Vec<E> = self
            .store
            .list(user_id)
            .await?
            .into_iter()
            .filter(|record| record.child_id() == Some(child_id))
            .collect();

        for record in &linked {
            self.store
                .modify(record.id(), E::unlink_child_patch(), Utc::now())
                .await?;
        }

        if !linked.is_empty() {
            info!(
                "Unlinked {} {} from child {}",
                linked.len(),
                E::COLLECTION,
                child_id
            );
        }
        Ok(linked.len())
    }
}
