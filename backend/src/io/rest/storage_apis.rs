//! # REST API for Storage Status
//!
//! Reports whether the session still writes to the database or has
//! switched to local storage, for the mode indicator.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;

use crate::AppState;
use shared::{StorageModeKind, StorageStatusResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(get_storage_status))
}

async fn get_storage_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/storage/status");

    let mode = state.storage_mode.kind();
    let message = match mode {
        StorageModeKind::Remote => "Saving to the database".to_string(),
        StorageModeKind::LocalOnly => {
            "Saving to local storage on this device. Changes are not copied to the database.".to_string()
        }
    };

    let response = StorageStatusResponse {
        mode,
        policy: state.storage_policy.to_string(),
        message,
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{expect_json, send, NO_BODY, TEST_ORIGIN};
    use axum::http::{Method, StatusCode};
    use shared::{StorageModeKind, StorageStatusResponse};

    use crate::storage::test_utils::{memory_storage, sqlite_storage};
    use crate::{create_router, AppState};

    #[tokio::test]
    async fn test_local_policy_reports_local_only() {
        let app = create_router(AppState::from_storage(memory_storage(), "guest"), TEST_ORIGIN).unwrap();
        let response = send(&app, Method::GET, "/api/storage/status", None, NO_BODY).await;
        let status: StorageStatusResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(status.mode, StorageModeKind::LocalOnly);
        assert_eq!(status.policy, "local");
    }

    #[tokio::test]
    async fn test_status_follows_fallback_switch() {
        let storage = sqlite_storage().await;
        let mode = storage.mode.clone();
        let app = create_router(AppState::from_storage(storage, "guest"), TEST_ORIGIN).unwrap();

        let response = send(&app, Method::GET, "/api/storage/status", None, NO_BODY).await;
        let status: StorageStatusResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(status.mode, StorageModeKind::Remote);
        assert_eq!(status.policy, "fallback");

        mode.switch_to_local();
        let response = send(&app, Method::GET, "/api/storage/status", None, NO_BODY).await;
        let status: StorageStatusResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(status.mode, StorageModeKind::LocalOnly);
    }
}
