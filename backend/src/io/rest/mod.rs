//! # REST API Interface Layer
//!
//! One module per resource, each exposing a `router()` that is nested
//! under `/api/<resource>` by [`crate::create_router`]. Handlers only
//! translate between HTTP and the domain services:
//!
//! - the current user comes from the [`CurrentUser`] extractor
//! - successful results are returned as JSON with 200 or 201
//! - errors go through [`error_response`], which picks the status code
//!   from the error type

pub mod calendar_apis;
pub mod child_apis;
pub mod current_user;
pub mod dashboard_apis;
pub mod document_apis;
pub mod error;
pub mod event_apis;
pub mod note_apis;
pub mod storage_apis;
pub mod task_apis;

pub use current_user::{CurrentUser, USER_ID_HEADER};
pub use error::{error_response, not_found, status_for};
