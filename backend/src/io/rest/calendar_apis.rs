//! # REST API for the Calendar
//!
//! Month grid with the current user's events and the focus month used by
//! the calendar screen for navigation.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};

use super::{error_response, CurrentUser};
use crate::AppState;
use shared::{CalendarFocusDate, CalendarMonthRequest, UpdateCalendarFocusRequest, UpdateCalendarFocusResponse};

/// Create a router for calendar related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/month", get(get_calendar_month))
        .route("/focus-date", get(get_focus_date).post(set_focus_date))
        .route("/focus-date/previous", post(navigate_previous_month))
        .route("/focus-date/next", post(navigate_next_month))
}

/// Month grid with the events occurring on each day
async fn get_calendar_month(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<CalendarMonthRequest>,
) -> impl IntoResponse {
    info!("GET /api/calendar/month - query: {:?}", query);

    let events = match state.event_service.list_events(user.id()).await {
        Ok(response) => response.events,
        Err(e) => {
            error!("Failed to load events for calendar: {}", e);
            return error_response(e);
        }
    };

    match state
        .calendar_service
        .generate_calendar_month(query.month, query.year, &events)
    {
        Ok(calendar) => (StatusCode::OK, Json(calendar)).into_response(),
        Err(e) => {
            warn!("Rejected calendar request: {}", e);
            error_response(e.into())
        }
    }
}

async fn get_focus_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/focus-date");
    (StatusCode::OK, Json(state.calendar_service.get_focus_date())).into_response()
}

async fn set_focus_date(
    State(state): State<AppState>,
    Json(request): Json<UpdateCalendarFocusRequest>,
) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date - request: {:?}", request);

    match state.calendar_service.set_focus_date(request.month, request.year) {
        Ok(focus_date) => (StatusCode::OK, Json(focus_response(&state, focus_date))).into_response(),
        Err(e) => {
            warn!("Rejected focus date: {}", e);
            error_response(e.into())
        }
    }
}

async fn navigate_previous_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date/previous");
    let focus_date = state.calendar_service.navigate_previous_month();
    (StatusCode::OK, Json(focus_response(&state, focus_date))).into_response()
}

async fn navigate_next_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date/next");
    let focus_date = state.calendar_service.navigate_next_month();
    (StatusCode::OK, Json(focus_response(&state, focus_date))).into_response()
}

fn focus_response(state: &AppState, focus_date: CalendarFocusDate) -> UpdateCalendarFocusResponse {
    UpdateCalendarFocusResponse {
        focus_date,
        success_message: format!(
            "Calendar set to {} {}",
            state.calendar_service.month_name(focus_date.month),
            focus_date.year
        ),
    }
}
