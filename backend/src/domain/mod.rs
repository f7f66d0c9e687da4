//! # Domain Module
//!
//! Business logic of the household organizer. Each service wraps one
//! repository from [`crate::storage`], enforces the required fields of its
//! entity and computes the derived views the screens show.
//!
//! - **child_service**: child profiles, age and initials, unlinking on delete
//! - **event_service**: events, upcoming occurrences
//! - **task_service**: tasks, completion toggle, filtered view with counts
//! - **document_service**: document metadata, filtered view with counts
//! - **note_service**: free-form notes with tags
//! - **calendar**: month grid and the session's focus month
//! - **dashboard_service**: home screen summary across all collections

pub mod calendar;
pub mod child_service;
pub mod dashboard_service;
pub mod document_service;
pub mod event_service;
pub mod models;
pub mod note_service;
pub mod task_service;

pub use calendar::*;
pub use child_service::*;
pub use dashboard_service::*;
pub use document_service::*;
pub use event_service::*;
pub use note_service::*;
pub use task_service::*;
