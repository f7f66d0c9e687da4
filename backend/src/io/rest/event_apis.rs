//! # REST API for Events
//!
//! CRUD endpoints for calendar events plus the upcoming-events list.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use log::{error, info};
use serde::Deserialize;

use super::{error_response, not_found, CurrentUser};
use crate::AppState;
use shared::{CreateEventRequest, UpdateEventRequest};

const DEFAULT_UPCOMING_LIMIT: usize = 5;

// Query parameters for the upcoming events API
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    /// First day to look at, today when absent
    pub from: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Create a router for event related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/upcoming", get(upcoming_events))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(mut request): Json<CreateEventRequest>,
) -> impl IntoResponse {
    info!("POST /api/events - request: {:?}", request);
    request.user_id = user.0;

    match state.event_service.create_event(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create event: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/events/{}", event_id);

    match state.event_service.get_event(&event_id).await {
        Ok(Some(event)) if event.user_id == user.id() => (StatusCode::OK, Json(event)).into_response(),
        Ok(_) => not_found("Event", &event_id),
        Err(e) => {
            error!("Failed to get event: {}", e);
            error_response(e)
        }
    }
}

pub async fn list_events(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/events - user: {}", user.id());

    match state.event_service.list_events(user.id()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list events: {}", e);
            error_response(e)
        }
    }
}

pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> impl IntoResponse {
    info!("PUT /api/events/{} - request: {:?}", event_id, request);

    if let Err(response) = user.check_owner(state.event_service.get_event(&event_id).await, "Event", &event_id) {
        return response;
    }

    match state.event_service.update_event(&event_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update event: {}", e);
            error_response(e)
        }
    }
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/events/{}", event_id);

    if let Err(response) = user.check_owner(state.event_service.get_event(&event_id).await, "Event", &event_id) {
        return response;
    }

    match state.event_service.delete_event(&event_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete event: {}", e);
            error_response(e)
        }
    }
}

/// Next upcoming events, recurring ones at their next occurrence
pub async fn upcoming_events(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<UpcomingQuery>,
) -> impl IntoResponse {
    info!("GET /api/events/upcoming - query: {:?}", query);

    let from = query.from.unwrap_or_else(|| Local::now().date_naive());
    let limit = query.limit.unwrap_or(DEFAULT_UPCOMING_LIMIT);

    match state.event_service.upcoming_events(user.id(), from, limit).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list upcoming events: {}", e);
            error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{expect_json, send, test_app, NO_BODY};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shared::{EventListResponse, EventResponse, Priority, RecurrencePattern};

    #[tokio::test]
    async fn test_create_event_applies_defaults() {
        let app = test_app();

        let response = send(
            &app,
            Method::POST,
            "/api/events",
            None,
            Some(&json!({
                "title": "Swim lessons",
                "eventType": "activity",
                "startDate": "2025-09-06",
                "startTime": "09:30:00",
                "isRecurring": true
            })),
        )
        .await;
        let created: EventResponse = expect_json(response, StatusCode::CREATED).await;
        assert_eq!(created.event.user_id, "guest");
        assert_eq!(created.event.priority, Priority::Medium);
        assert_eq!(created.event.recurrence_pattern, Some(RecurrencePattern::Weekly));
    }

    #[tokio::test]
    async fn test_end_before_start_is_rejected() {
        let app = test_app();
        let response = send(
            &app,
            Method::POST,
            "/api/events",
            None,
            Some(&json!({
                "title": "Camp",
                "eventType": "activity",
                "startDate": "2025-07-10",
                "endDate": "2025-07-01"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_and_upcoming_events() {
        let app = test_app();
        for (title, start) in [("Parent night", "2025-09-25"), ("Picture day", "2025-09-05"), ("Orientation", "2025-08-20")] {
            let body = json!({ "title": title, "eventType": "school", "startDate": start });
            let response = send(&app, Method::POST, "/api/events", None, Some(&body)).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = send(&app, Method::GET, "/api/events", None, NO_BODY).await;
        let list: EventListResponse = expect_json(response, StatusCode::OK).await;
        let titles: Vec<&str> = list.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Orientation", "Picture day", "Parent night"]);

        let response = send(&app, Method::GET, "/api/events/upcoming?from=2025-09-01&limit=1", None, NO_BODY).await;
        let upcoming: EventListResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(upcoming.events.len(), 1);
        assert_eq!(upcoming.events[0].title, "Picture day");
    }
}
