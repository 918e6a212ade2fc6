use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
    Extension, Json, Router,
};
use db::models::project::{CreateProject, Project};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, middleware::load_project_middleware, routes, AppState};

pub async fn get_projects(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&state.db().conn).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }
    let project = Project::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Project::delete(&state.db().conn, project.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }
    state.resolver().invalidate(project.id).await;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let project_id_router = Router::new()
        .route("/", get(get_project).delete(delete_project))
        .route(
            "/categories",
            get(routes::categories::get_project_categories)
                .post(routes::categories::create_category),
        )
        .route(
            "/columns",
            get(routes::columns::get_project_columns).post(routes::columns::create_column),
        )
        .layer(from_fn_with_state(state.clone(), load_project_middleware));

    let projects_router = Router::new()
        .route("/", get(get_projects).post(create_project))
        .nest("/{project_id}", project_id_router);

    Router::new().nest("/projects", projects_router)
}
