//! # REST API for Notes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use super::{error_response, not_found, CurrentUser};
use crate::AppState;
use shared::{CreateNoteRequest, UpdateNoteRequest};

/// Create a router for note related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/:id", get(get_note).put(update_note).delete(delete_note))
}

pub async fn create_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(mut request): Json<CreateNoteRequest>,
) -> impl IntoResponse {
    info!("POST /api/notes");
    request.user_id = user.0;

    match state.note_service.create_note(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create note: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/notes/{}", note_id);

    match state.note_service.get_note(&note_id).await {
        Ok(Some(note)) if note.user_id == user.id() => (StatusCode::OK, Json(note)).into_response(),
        Ok(_) => not_found("Note", &note_id),
        Err(e) => {
            error!("Failed to get note: {}", e);
            error_response(e)
        }
    }
}

pub async fn list_notes(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/notes - user: {}", user.id());

    match state.note_service.list_notes(user.id()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list notes: {}", e);
            error_response(e)
        }
    }
}

pub async fn update_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> impl IntoResponse {
    info!("PUT /api/notes/{}", note_id);

    if let Err(response) = user.check_owner(state.note_service.get_note(&note_id).await, "Note", &note_id) {
        return response;
    }

    match state.note_service.update_note(&note_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update note: {}", e);
            error_response(e)
        }
    }
}

pub async fn delete_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/notes/{}", note_id);

    if let Err(response) = user.check_owner(state.note_service.get_note(&note_id).await, "Note", &note_id) {
        return response;
    }

    match state.note_service.delete_note(&note_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete note: {}", e);
            error_response(e)
        }
    }
}
