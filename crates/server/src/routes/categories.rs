use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, post},
    Extension, Json, Router,
};
use db::models::{
    category::{
        Category, CategoryError, CategoryOption, CategoryWithOptions, CreateCategory,
        CreateCategoryOption,
    },
    project::Project,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// Reads go through the resolver so they hit the cache.
pub async fn get_project_categories(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<CategoryWithOptions>>>, ApiError> {
    let categories = state.resolver().resolve(project.id).await?;
    Ok(ResponseJson(ApiResponse::success((*categories).clone())))
}

pub async fn create_category(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Category name is required".to_string(),
        ));
    }
    let category =
        Category::create(&state.db().conn, project.id, &payload, Uuid::new_v4()).await?;
    state.resolver().invalidate(project.id).await;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let category = Category::find_by_id(&state.db().conn, category_id)
        .await?
        .ok_or(CategoryError::CategoryNotFound)?;
    Category::deactivate(&state.db().conn, category_id).await?;
    state.resolver().invalidate(category.project_id).await;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn create_option(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CreateCategoryOption>,
) -> Result<ResponseJson<ApiResponse<CategoryOption>>, ApiError> {
    if payload.option_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Option name is required".to_string()));
    }
    let category = Category::find_by_id(&state.db().conn, category_id)
        .await?
        .ok_or(CategoryError::CategoryNotFound)?;
    let option =
        CategoryOption::create(&state.db().conn, category_id, &payload, Uuid::new_v4()).await?;
    state.resolver().invalidate(category.project_id).await;
    Ok(ResponseJson(ApiResponse::success(option)))
}

pub async fn delete_option(
    State(state): State<AppState>,
    Path(option_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let category_id = CategoryOption::category_uuid(&state.db().conn, option_id)
        .await?
        .ok_or(CategoryError::OptionNotFound)?;
    CategoryOption::deactivate(&state.db().conn, option_id).await?;
    if let Some(category) = Category::find_by_id(&state.db().conn, category_id).await? {
        state.resolver().invalidate(category.project_id).await;
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Mutations on existing categories and options. Project-scoped listing and
/// creation live under the projects router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/{category_id}", delete(delete_category))
        .route("/categories/{category_id}/options", post(create_option))
        .route("/options/{option_id}", delete(delete_option))
}
