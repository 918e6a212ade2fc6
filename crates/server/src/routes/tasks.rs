use axum::{
    extract::{Query, State},
    http::HeaderMap,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
    Extension, Json, Router,
};
use db::models::{
    kanban_column::KanbanColumn,
    task::{CategorySelection, CreateTask, Task, UpdateTask},
    timeline_entry::TimelineEntry,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, middleware::load_task_middleware, routes::acting_user, AppState};

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MoveTaskRequest {
    pub column_id: Uuid,
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

/// Timeline entry plus display names resolved at read time. Raw uuids stay
/// in `details`; `display` degrades to the uuid string when a referenced row
/// is gone.
#[derive(Debug, Serialize)]
pub struct TimelineEntryView {
    #[serde(flatten)]
    pub entry: TimelineEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<serde_json::Value>,
}

pub async fn get_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let project_id = query
        .project_id
        .ok_or_else(|| ApiError::BadRequest("project_id query parameter is required".to_string()))?;
    let tasks = Task::find_by_project_id(&state.db().conn, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }
    let task = state
        .kanban()
        .create_task(&payload, &acting_user(&headers))
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state
        .kanban()
        .update_task(task.id, &payload, &acting_user(&headers))
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Task::delete(&state.db().conn, task.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn move_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MoveTaskRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state
        .kanban()
        .move_task(
            task.id,
            payload.column_id,
            payload.sort_order,
            &acting_user(&headers),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task_categories(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Vec<CategorySelection>>,
) -> Result<ResponseJson<ApiResponse<Vec<CategorySelection>>>, ApiError> {
    let selections = state
        .kanban()
        .update_categories(task.id, payload, &acting_user(&headers))
        .await?;
    Ok(ResponseJson(ApiResponse::success(selections)))
}

pub async fn comment_on_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CommentRequest>,
) -> Result<ResponseJson<ApiResponse<TimelineEntry>>, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment body is required".to_string()));
    }
    let entry = state
        .kanban()
        .comment(task.id, &acting_user(&headers), payload.body)
        .await?;
    Ok(ResponseJson(ApiResponse::success(entry)))
}

async fn column_label(state: &AppState, value: &serde_json::Value) -> Option<String> {
    let id: Uuid = value.as_str()?.parse().ok()?;
    match KanbanColumn::name_by_uuid(&state.db().conn, id).await {
        Ok(Some(name)) => Some(name),
        Ok(None) => Some(id.to_string()),
        Err(err) => {
            tracing::warn!("column label lookup failed: {err}");
            Some(id.to_string())
        }
    }
}

pub async fn get_task_timeline(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TimelineEntryView>>>, ApiError> {
    let entries = TimelineEntry::find_by_task_id(&state.db().conn, task.id).await?;

    let mut views = Vec::with_capacity(entries.len());
    for entry in entries {
        let display = match entry.action {
            db::types::TimelineAction::Moved => {
                let from = column_label(&state, &entry.details["from_column"]).await;
                let to = column_label(&state, &entry.details["to_column"]).await;
                match (from, to) {
                    (Some(from), Some(to)) => {
                        Some(json!({ "from_column": from, "to_column": to }))
                    }
                    _ => None,
                }
            }
            db::types::TimelineAction::CategoriesUpdated => {
                let selections: Vec<CategorySelection> = serde_json::from_value(
                    entry.details["selections"].clone(),
                )
                .unwrap_or_default();
                let labels = state.resolver().selection_labels(&selections).await?;
                Some(json!({ "selections": labels }))
            }
            _ => None,
        };
        views.push(TimelineEntryView { entry, display });
    }
    Ok(ResponseJson(ApiResponse::success(views)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/move", post(move_task))
        .route("/categories", put(update_task_categories))
        .route("/comments", post(comment_on_task))
        .route("/timeline", get(get_task_timeline))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
