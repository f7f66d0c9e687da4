/// Test utilities for building storage stacks on temporary directories
///
/// Everything created here lives inside a `TempDir` that is removed when the
/// environment is dropped, even if the test panics.
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use super::{DbConnection, FileBackend, KeyValueBackend, MemoryBackend, Storage, StoragePolicy};

/// Temporary data directory with a file backend and a SQLite database in it
pub struct TestEnvironment {
    pub backend: Arc<FileBackend>,
    pub db: DbConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let backend = Arc::new(FileBackend::new(temp_dir.path().join("local"))?);
        let db = DbConnection::open(&temp_dir.path().join("concierge.db")).await?;
        Ok(Self {
            backend,
            db,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }

    /// Storage for `policy` on top of this environment
    pub fn storage(&self, policy: StoragePolicy) -> Result<Storage> {
        let local: Arc<dyn KeyValueBackend> = self.backend.clone();
        Storage::build(policy, Some(self.db.clone()), local)
    }
}

/// Local-only storage on a fresh in-memory backend
pub fn memory_storage() -> Storage {
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    Storage::build(StoragePolicy::Local, None, backend).expect("Failed to build storage")
}

/// Fallback storage over an in-memory database and an in-memory backend
pub async fn sqlite_storage() -> Storage {
    let db = DbConnection::in_memory()
        .await
        .expect("Failed to create test database");
    let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
    Storage::build(StoragePolicy::Fallback, Some(db), backend).expect("Failed to build storage")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CreateNoteRequest;

    #[tokio::test]
    async fn test_environment_writes_into_temp_dir() {
        let env = TestEnvironment::new().await.unwrap();
        let local = env.storage(StoragePolicy::Local).unwrap();
        local
            .notes
            .create(CreateNoteRequest {
                user_id: "u1".to_string(),
                content: "Bring snacks on Friday".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(env.base_path.join("local").join("parent_concierge.notes.json").exists());
        assert!(env.base_path.join("concierge.db").exists());
    }
}
