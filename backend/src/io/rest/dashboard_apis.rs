//! # REST API for the Dashboard

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use super::{error_response, CurrentUser};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

/// Home screen summary for the current user
async fn get_dashboard(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/dashboard - user: {}", user.id());

    match state.dashboard_service.summary(user.id()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!("Failed to build dashboard: {}", e);
            error_response(e)
        }
    }
}
