//! # REST API for Tasks
//!
//! CRUD endpoints for tasks, the completion toggle and the filtered view
//! used by the task screen.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{error, info};

use super::{error_response, not_found, CurrentUser};
use crate::AppState;
use shared::{CreateTaskRequest, TaskFilter, UpdateTaskRequest};

/// Create a router for task related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/view", get(view_tasks))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/:id/toggle", post(toggle_task))
}

pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(mut request): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    info!("POST /api/tasks - request: {:?}", request);
    request.user_id = user.0;

    match state.task_service.create_task(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create task: {}", e);
            error_response(e)
        }
    }
}

pub async fn get_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/tasks/{}", task_id);

    match state.task_service.get_task(&task_id).await {
        Ok(Some(task)) if task.user_id == user.id() => (StatusCode::OK, Json(task)).into_response(),
        Ok(_) => not_found("Task", &task_id),
        Err(e) => {
            error!("Failed to get task: {}", e);
            error_response(e)
        }
    }
}

pub async fn list_tasks(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/tasks - user: {}", user.id());

    match state.task_service.list_tasks(user.id()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list tasks: {}", e);
            error_response(e)
        }
    }
}

/// Filtered task list with the counts for every status tab
pub async fn view_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<TaskFilter>,
) -> impl IntoResponse {
    info!("GET /api/tasks/view - filter: {:?}", filter);

    match state.task_service.view_tasks(user.id(), &filter).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to view tasks: {}", e);
            error_response(e)
        }
    }
}

pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
    Json(request): Json<UpdateTaskRequest>,
) -> impl IntoResponse {
    info!("PUT /api/tasks/{} - request: {:?}", task_id, request);

    if let Err(response) = user.check_owner(state.task_service.get_task(&task_id).await, "Task", &task_id) {
        return response;
    }

    match state.task_service.update_task(&task_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update task: {}", e);
            error_response(e)
        }
    }
}

pub async fn toggle_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/tasks/{}/toggle", task_id);

    if let Err(response) = user.check_owner(state.task_service.get_task(&task_id).await, "Task", &task_id) {
        return response;
    }

    match state.task_service.toggle_task(&task_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to toggle task: {}", e);
            error_response(e)
        }
    }
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/tasks/{}", task_id);

    if let Err(response) = user.check_owner(state.task_service.get_task(&task_id).await, "Task", &task_id) {
        return response;
    }

    match state.task_service.delete_task(&task_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete task: {}", e);
            error_response(e)
        }
    }
}
