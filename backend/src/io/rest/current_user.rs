//! Identity of the caller

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use log::warn;
use std::convert::Infallible;

use super::{error_response, not_found};
use crate::storage::Entity;
use crate::AppState;

/// Header carrying the current user's id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user a request acts for
///
/// Taken from the `X-User-Id` header. Requests without one act as the
/// configured guest user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Check a looked-up record before acting on it by id.
    ///
    /// Another user's record answers 404, exactly like a missing one. A
    /// record that does not exist passes, so update and delete keep their
    /// own missing-record behavior.
    pub fn check_owner<E: Entity>(
        &self,
        found: anyhow::Result<Option<E>>,
        what: &str,
        id: &str,
    ) -> Result<(), Response> {
        match found {
            Ok(Some(record)) if record.user_id() != self.id() => {
                warn!("User {} tried to access {} {} of another user", self.id(), what, id);
                Err(not_found(what, id))
            }
            Ok(_) => Ok(()),
            Err(e) => Err(error_response(e)),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| state.guest_user_id.clone());

        Ok(CurrentUser(user_id))
    }
}
