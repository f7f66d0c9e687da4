//! # REST API for Child Management
//!
//! Endpoints for creating, retrieving, updating, and deleting children.

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
use shared::{CreateChildRequest, UpdateChildRequest};

/// Create a router for child related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_children).post(create_child))
        .route("/:id", get(get_child).put(update_child).delete(delete_child))
}

/// Create a new child for the current user
pub async fn create_child(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(mut request): Json<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - request: {:?}", request);
    request.user_id = user.0;

    match state.child_service.create_child(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to create child: {}", e);
            error_response(e)
        }
    }
}

/// Get a child by ID
pub async fn get_child(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}", child_id);

    match state.child_service.get_child(&child_id).await {
        Ok(Some(child)) if child.user_id == user.id() => (StatusCode::OK, Json(child)).into_response(),
        Ok(_) => not_found("Child", &child_id),
        Err(e) => {
            error!("Failed to get child: {}", e);
            error_response(e)
        }
    }
}

/// List the current user's children with age and initials
pub async fn list_children(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    info!("GET /api/children - user: {}", user.id());

    match state.child_service.list_children(user.id()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list children: {}", e);
            error_response(e)
        }
    }
}

/// Update a child
pub async fn update_child(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(child_id): Path<String>,
    Json(request): Json<UpdateChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/children/{} - request: {:?}", child_id, request);

    if let Err(response) = user.check_owner(state.child_service.get_child(&child_id).await, "Child", &child_id) {
        return response;
    }

    match state.child_service.update_child(&child_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to update child: {}", e);
            error_response(e)
        }
    }
}

/// Delete a child and unlink its owner's records from it
pub async fn delete_child(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}", child_id);

    if let Err(response) = user.check_owner(state.child_service.get_child(&child_id).await, "Child", &child_id) {
        return response;
    }

    match state.child_service.delete_child(&child_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to delete child: {}", e);
            error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{expect_json, send, test_app, NO_BODY};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shared::{ChildListResponse, ChildResponse, DeleteResponse, ErrorResponse, Task, TaskResponse};

    #[tokio::test]
    async fn test_create_and_list_children() {
        let app = test_app();

        let response = send(
            &app,
            Method::POST,
            "/api/children",
            Some("parent-1"),
            Some(&json!({ "name": "Emma Johnson", "birthDate": "2015-03-15", "school": null })),
        )
        .await;
        let created: ChildResponse = expect_json(response, StatusCode::CREATED).await;
        assert_eq!(created.child.user_id, "parent-1");
        assert_eq!(created.child.school, None);

        let response = send(&app, Method::GET, "/api/children", Some("parent-1"), NO_BODY).await;
        let list: ChildListResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(list.children.len(), 1);
        assert_eq!(list.children[0].initials, "EJ");
        assert!(list.children[0].age.is_some());

        // The guest sees nothing of parent-1
        let response = send(&app, Method::GET, "/api/children", None, NO_BODY).await;
        let list: ChildListResponse = expect_json(response, StatusCode::OK).await;
        assert!(list.children.is_empty());

        let uri = format!("/api/children/{}", created.child.id);
        let response = send(&app, Method::GET, &uri, None, NO_BODY).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_child_without_name_is_rejected() {
        let app = test_app();
        let response = send(&app, Method::POST, "/api/children", None, Some(&json!({ "name": "  " }))).await;
        let body: ErrorResponse = expect_json(response, StatusCode::BAD_REQUEST).await;
        assert!(body.error.contains("name"));
    }

    #[tokio::test]
    async fn test_update_and_delete_child() {
        let app = test_app();
        let response = send(&app, Method::POST, "/api/children", None, Some(&json!({ "name": "Liam" }))).await;
        let created: ChildResponse = expect_json(response, StatusCode::CREATED).await;
        let uri = format!("/api/children/{}", created.child.id);

        let response = send(&app, Method::PUT, &uri, None, Some(&json!({ "grade": "2nd" }))).await;
        let updated: ChildResponse = expect_json(response, StatusCode::OK).await;
        assert_eq!(updated.child.grade.as_deref(), Some("2nd"));
        assert!(updated.child.updated_at > created.child.updated_at);

        let response = send(&app, Method::DELETE, &uri, None, NO_BODY).await;
        let deleted: DeleteResponse = expect_json(response, StatusCode::OK).await;
        assert!(deleted.deleted);

        let response = send(&app, Method::PUT, &uri, None, Some(&json!({ "grade": "3rd" }))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_child_of_another_user() {
        let app = test_app();
        let response = send(&app, Method::POST, "/api/children", Some("parent-1"), Some(&json!({ "name": "Emma" }))).await;
        let child: ChildResponse = expect_json(response, StatusCode::CREATED).await;
        let response = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some("parent-1"),
            Some(&json!({ "title": "Field trip form", "childId": &child.child.id })),
        )
        .await;
        let task: TaskResponse = expect_json(response, StatusCode::CREATED).await;

        // Without the owner's header the child is out of reach
        let uri = format!("/api/children/{}", child.child.id);
        let response = send(&app, Method::DELETE, &uri, None, NO_BODY).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, Method::PUT, &uri, Some("parent-2"), Some(&json!({ "grade": "1st" }))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, Method::GET, &uri, Some("parent-1"), NO_BODY).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::DELETE, &uri, Some("parent-1"), NO_BODY).await;
        let deleted: DeleteResponse = expect_json(response, StatusCode::OK).await;
        assert!(deleted.deleted);

        let task_uri = format!("/api/tasks/{}", task.task.id);
        let response = send(&app, Method::GET, &task_uri, Some("parent-1"), NO_BODY).await;
        let task: Task = expect_json(response, StatusCode::OK).await;
        assert_eq!(task.child_id, None);
    }
}
