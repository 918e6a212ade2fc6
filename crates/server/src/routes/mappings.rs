use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
    Json, Router,
};
use db::models::master_mapping::{CreateMasterMapping, MasterMapping};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

pub async fn get_mappings(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<MasterMapping>>>, ApiError> {
    let mappings = MasterMapping::find_all(&state.db().conn).await?;
    Ok(ResponseJson(ApiResponse::success(mappings)))
}

pub async fn create_mapping(
    State(state): State<AppState>,
    Json(payload): Json<CreateMasterMapping>,
) -> Result<ResponseJson<ApiResponse<MasterMapping>>, ApiError> {
    if payload.external_identity_value.trim().is_empty()
        || payload.internal_user_email.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "external_identity_value and internal_user_email are required".to_string(),
        ));
    }
    let mapping = MasterMapping::create(&state.db().conn, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(mapping)))
}

pub async fn delete_mapping(
    State(state): State<AppState>,
    Path(mapping_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = MasterMapping::delete(&state.db().conn, mapping_id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Mapping not found".to_string()));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mappings", get(get_mappings).post(create_mapping))
        .route("/mappings/{mapping_id}", delete(delete_mapping))
}
