//! # Parent Concierge Backend
//!
//! Household organizer for parents: child profiles, events, tasks,
//! document metadata and notes, served as a JSON REST API.
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (services, derived views)
//!     ↓
//! Storage Layer (SQLite, local JSON store, fallback between them)
//! ```
//!
//! [`initialize_backend`] builds the storage stack chosen by the
//! configuration and the services on top of it; [`create_router`] wires
//! them into the axum router.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::domain::{
    CalendarService, ChildService, DashboardService, DocumentService, EventService, NoteService,
    TaskService,
};
use crate::storage::{DbConnection, FileBackend, KeyValueBackend, Storage, StorageMode, StoragePolicy};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub child_service: ChildService,
    pub event_service: EventService,
    pub task_service: TaskService,
    pub document_service: DocumentService,
    pub note_service: NoteService,
    pub calendar_service: CalendarService,
    pub dashboard_service: DashboardService,
    pub storage_mode: StorageMode,
    pub storage_policy: StoragePolicy,
    pub guest_user_id: String,
}

impl AppState {
    /// Build every service on top of one storage stack
    pub fn from_storage(storage: Storage, guest_user_id: impl Into<String>) -> Self {
        Self {
            child_service: ChildService::new(storage.clone()),
            event_service: EventService::new(storage.events.clone()),
            task_service: TaskService::new(storage.tasks.clone()),
            document_service: DocumentService::new(storage.documents.clone()),
            note_service: NoteService::new(storage.notes.clone()),
            calendar_service: CalendarService::new(),
            dashboard_service: DashboardService::new(storage.clone()),
            storage_mode: storage.mode.clone(),
            storage_policy: storage.policy,
            guest_user_id: guest_user_id.into(),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up local storage in {}", config.local_dir().display());
    let local: Arc<dyn KeyValueBackend> = Arc::new(FileBackend::new(config.local_dir())?);

    let db = match config.storage_policy {
        StoragePolicy::Local => None,
        policy => {
            info!("Setting up database");
            match open_database(config).await {
                Ok(db) => Some(db),
                Err(e) if policy == StoragePolicy::Fallback => {
                    warn!("Could not open database, continuing with local storage: {:#}", e);
                    None
                }
                Err(e) => return Err(e),
            }
        }
    };

    let storage = Storage::build(config.storage_policy, db, local)?;

    info!("Setting up application state");
    Ok(AppState::from_storage(storage, config.guest_user_id.clone()))
}

async fn open_database(config: &AppConfig) -> Result<DbConnection> {
    match &config.database_url {
        Some(url) => DbConnection::connect(url).await,
        None => DbConnection::open(&config.database_path()).await,
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/children", io::child_apis::router())
        .nest("/events", io::event_apis::router())
        .nest("/tasks", io::task_apis::router())
        .nest("/documents", io::document_apis::router())
        .nest("/notes", io::note_apis::router())
        .nest("/calendar", io::calendar_apis::router())
        .nest("/dashboard", io::dashboard_apis::router())
        .nest("/storage", io::storage_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::StorageModeKind;
    use tempfile::TempDir;

    fn config_for(temp_dir: &TempDir, extra: &[(&str, String)]) -> AppConfig {
        let data_dir = temp_dir.path().to_string_lossy().to_string();
        AppConfig::from_lookup(|key| {
            if key == "CONCIERGE_DATA_DIR" {
                return Some(data_dir.clone());
            }
            extra.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_backend_with_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir, &[]);

        let state = initialize_backend(&config).await.unwrap();
        assert_eq!(state.storage_policy, StoragePolicy::Fallback);
        assert_eq!(state.storage_mode.kind(), StorageModeKind::Remote);
        assert!(config.database_path().exists());
        assert!(config.local_dir().exists());
    }

    #[tokio::test]
    async fn test_unreachable_database_falls_back_to_local() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", temp_dir.path().join("missing/dir/concierge.db").display());
        let config = config_for(&temp_dir, &[("CONCIERGE_DATABASE_URL", url.clone())]);

        let state = initialize_backend(&config).await.unwrap();
        assert_eq!(state.storage_mode.kind(), StorageModeKind::LocalOnly);

        let strict = config_for(
            &temp_dir,
            &[("CONCIERGE_DATABASE_URL", url), ("CONCIERGE_STORAGE", "remote".to_string())],
        );
        assert!(initialize_backend(&strict).await.is_err());
    }

    #[tokio::test]
    async fn test_local_policy_skips_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir, &[("CONCIERGE_STORAGE", "local".to_string())]);

        let state = initialize_backend(&config).await.unwrap();
        assert_eq!(state.storage_mode.kind(), StorageModeKind::LocalOnly);
        assert!(!config.database_path().exists());
    }

    #[test]
    fn test_create_router_rejects_invalid_origin() {
        let state = AppState::from_storage(crate::storage::test_utils::memory_storage(), "guest");
        assert!(create_router(state, "http://bad\norigin").is_err());
    }
}
