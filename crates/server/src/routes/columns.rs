use axum::{
    extract::State,
    response::Json as ResponseJson,
    Extension, Json,
};
use db::models::{
    kanban_column::{CreateKanbanColumn, KanbanColumn},
    project::Project,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

pub async fn get_project_columns(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<KanbanColumn>>>, ApiError> {
    let columns = KanbanColumn::find_by_project_id(&state.db().conn, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(columns)))
}

pub async fn create_column(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    Json(payload): Json<CreateKanbanColumn>,
) -> Result<ResponseJson<ApiResponse<KanbanColumn>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Column name is required".to_string()));
    }
    let column =
        KanbanColumn::create(&state.db().conn, project.id, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(column)))
}
