//! # REST API for Documents
//!
//! Document metadata endpoints. Only the `fileUrl` is stored, the file
//! itself lives wherever that URL points.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use super::{error_response, not_found, CurrentUser};
use crate::AppState;
use shared::{CreateDocumentRequest, DocumentFilter, UpdateDocumentRequest};

/// Create a router for document related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route("/view", get(view_documents))
        .route("/:id", get(get_document).put(update_document).delete(delete_document))
}

pub async fn create_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(mut request): Json<CreateDocumentRequest>,
) -> impl IntoResponse {
    info!("POST /api/documents - request: {:?}", request);
    request.user_id = user.0;

    match state.document_service.create_document(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create document: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/documents/{}", document_id);

    match state.document_service.get_document(&document_id).await {
        Ok(Some(document)) if document.user_id == user.id() => (StatusCode::OK, Json(document)).into_response(),
        Ok(_) => not_found("Document", &document_id),
        Err(e) => {
            error!("Failed to get document: {}", e);
            error_response(e)
        }
    }
}

pub async fn list_documents(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/documents - user: {}", user.id());

    match state.document_service.list_documents(user.id()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list documents: {}", e);
            error_response(e)
        }
    }
}

/// Filtered document list with the counts for every tab
pub async fn view_documents(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<DocumentFilter>,
) -> impl IntoResponse {
    info!("GET /api/documents/view - filter: {:?}", filter);

    match state.document_service.view_documents(user.id(), &filter).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to view documents: {}", e);
            error_response(e)
        }
    }
}

pub async fn update_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(document_id): Path<String>,
    Json(request): Json<UpdateDocumentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/documents/{} - request: {:?}", document_id, request);

    if let Err(response) = user.check_owner(state.document_service.get_document(&document_id).await, "Document", &document_id) {
        return response;
    }

    match state.document_service.update_document(&document_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update document: {}", e);
            error_response(e)
        }
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/documents/{}", document_id);

    if let Err(response) = user.check_owner(state.document_service.get_document(&document_id).await, "Document", &document_id) {
        return response;
    }

    match state.document_service.delete_document(&document_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete document: {}", e);
            error_response(e)
        }
    }
}
