use crate::storage::{JsonStorage, StorageError};
use crate::task::{Task, TaskInput, TaskService};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;

/// Shared state for the task routes.
#[derive(Clone)]
pub struct TaskState {
    pub storage: Arc<JsonStorage>,
}

/// Custom error type for task handler operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// Represents a path ID that is not a 64-bit integer.
    #[error("Invalid task ID '{0}'")]
    InvalidId(String),
    /// Represents a request body that is not a JSON task.
    #[error("Invalid task body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    /// Represents a storage failure, including a missing task.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for TaskApiError {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            TaskApiError::InvalidId(_) | TaskApiError::InvalidBody(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            TaskApiError::Storage(StorageError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Task not found".to_string())
            }
            TaskApiError::Storage(err) => {
                tracing::error!("Task storage failure: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };
        (status_code, message).into_response()
    }
}

/// Parses the `{id}` path segment.
fn parse_task_id(raw_id: &str) -> Result<i64, TaskApiError> {
    raw_id
        .parse()
        .map_err(|_| TaskApiError::InvalidId(raw_id.to_string()))
}

/// Decodes a create/update body. The `Content-Type` header is not checked.
fn decode_task_input(body: &[u8]) -> Result<TaskInput, TaskApiError> {
    serde_json::from_slice(body).map_err(TaskApiError::InvalidBody)
}

/// Handler for GET /tasks - Returns all tasks as a JSON array.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks",
    responses(
        (status = 200, description = "Every stored task", body = [Task]),
        (status = 500, description = "Task file could not be read", body = String)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<Vec<Task>>, TaskApiError> {
    let tasks = TaskService::new(&state.storage).list_tasks().await?;
    Ok(Json(tasks))
}

/// Handler for GET /tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "The requested task", body = Task),
        (status = 400, description = "ID is not an integer", body = String),
        (status = 404, description = "Task not found", body = String),
        (status = 500, description = "Task file could not be read", body = String)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Task>, TaskApiError> {
    let id = parse_task_id(&raw_id)?;
    let task = TaskService::new(&state.storage).get_task(id).await?;
    Ok(Json(task))
}

/// Handler for POST /tasks - Creates a task and returns it with its assigned ID.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = TaskInput,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Body is not a JSON task", body = String),
        (status = 500, description = "Task file could not be updated", body = String)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Task>), TaskApiError> {
    let input = decode_task_input(&body)?;
    let task = TaskService::new(&state.storage).create_task(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for PUT /tasks/{id} - Replaces a task's title, description and completion flag.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "ID is not an integer or body is not a JSON task", body = String),
        (status = 404, description = "Task not found", body = String),
        (status = 500, description = "Task file could not be updated", body = String)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, TaskApiError> {
    let id = parse_task_id(&raw_id)?;
    let input = decode_task_input(&body)?;
    let task = TaskService::new(&state.storage)
        .update_task(id, input)
        .await?;
    Ok(Json(task))
}

/// Handler for DELETE /tasks/{id} - Removes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 400, description = "ID is not an integer", body = String),
        (status = 404, description = "Task not found", body = String),
        (status = 500, description = "Task file could not be updated", body = String)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, TaskApiError> {
    let id = parse_task_id(&raw_id)?;
    TaskService::new(&state.storage).delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the task router.
pub fn create_task_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}
