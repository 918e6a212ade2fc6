use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post, put},
    Json, Router,
};
use db::models::tracker_config::{TrackerConfig, TrackerConfigInfo, UpsertTrackerConfig};
use serde::Deserialize;
use services::services::tracker::{SearchOutcome, TrackerCredentials, TrackerError};
use utils::response::ApiResponse;

use crate::{error::ApiError, routes::acting_user, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub project_key: String,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub project_key: String,
    pub summary: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIssueRequest {
    pub summary: Option<String>,
    pub description: Option<String>,
}

async fn credentials_for(state: &AppState, user_email: &str) -> Result<TrackerCredentials, ApiError> {
    let config = TrackerConfig::find_by_user_email(&state.db().conn, user_email)
        .await?
        .ok_or(TrackerError::NotConfigured)?;
    Ok(TrackerCredentials {
        base_url: config.base_url,
        account_email: config.account_email,
        api_token: config.api_token,
    })
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<ResponseJson<ApiResponse<SearchOutcome>>, ApiError> {
    if query.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query is required".to_string()));
    }
    let credentials = credentials_for(&state, &acting_user(&headers)).await?;
    let outcome = state
        .tracker()
        .search(&credentials, &query.project_key, &query.query)
        .await?;
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub async fn get_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<TrackerConfigInfo>>, ApiError> {
    let config = TrackerConfig::find_by_user_email(&state.db().conn, &acting_user(&headers))
        .await?
        .ok_or_else(|| ApiError::NotFound("Tracker is not configured".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(config.info())))
}

pub async fn put_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut payload): Json<UpsertTrackerConfig>,
) -> Result<ResponseJson<ApiResponse<TrackerConfigInfo>>, ApiError> {
    if payload.base_url.trim().is_empty() {
        let default_base_url = state.config().read().await.default_tracker_base_url.clone();
        match default_base_url {
            Some(url) => payload.base_url = url,
            None => {
                return Err(ApiError::BadRequest("base_url is required".to_string()));
            }
        }
    }
    if payload.api_token.trim().is_empty() {
        return Err(ApiError::BadRequest("api_token is required".to_string()));
    }
    let config =
        TrackerConfig::upsert_for_user(&state.db().conn, &acting_user(&headers), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(config.info())))
}

pub async fn create_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateIssueRequest>,
) -> Result<ResponseJson<ApiResponse<String>>, ApiError> {
    if payload.summary.trim().is_empty() {
        return Err(ApiError::BadRequest("summary is required".to_string()));
    }
    let credentials = credentials_for(&state, &acting_user(&headers)).await?;
    let key = state
        .tracker()
        .create_issue(
            &credentials,
            &payload.project_key,
            &payload.summary,
            payload.description.as_deref(),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(key)))
}

pub async fn update_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(issue_key): Path<String>,
    Json(payload): Json<UpdateIssueRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let credentials = credentials_for(&state, &acting_user(&headers)).await?;
    state
        .tracker()
        .update_issue(
            &credentials,
            &issue_key,
            payload.summary.as_deref(),
            payload.description.as_deref(),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tracker/search", get(search))
        .route("/tracker/config", get(get_config).put(put_config))
        .route("/tracker/issues", post(create_issue))
        .route("/tracker/issues/{issue_key}", put(update_issue))
}
