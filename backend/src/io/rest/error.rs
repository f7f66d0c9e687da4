//! Mapping from domain and storage errors to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::domain::models::{
    ChildValidationError, DocumentValidationError, EventValidationError, NoteValidationError,
    TaskValidationError,
};
use crate::domain::CalendarError;
use crate::storage::StoreError;
use shared::ErrorResponse;

/// Status code for an error returned by a domain service
pub fn status_for(err: &anyhow::Error) -> StatusCode {
    if let Some(store_error) = err.downcast_ref::<StoreError>() {
        return match store_error {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
    }

    let is_validation = err.is::<ChildValidationError>()
        || err.is::<EventValidationError>()
        || err.is::<TaskValidationError>()
        || err.is::<DocumentValidationError>()
        || err.is::<NoteValidationError>()
        || err.is::<CalendarError>();

    if is_validation {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// JSON error body with the status matching the error
pub fn error_response(err: anyhow::Error) -> Response {
    let status = status_for(&err);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub fn not_found(what: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{} not found: {}", what, id),
        }),
    )
        .into_response()
}
