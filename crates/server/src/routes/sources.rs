use axum::{
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
    Json, Router,
};
use db::models::{
    ticket_source::{CreateTicketSource, TicketSource},
    uploaded_ticket::UploadedTicket,
};
use services::services::ingest::ImportSummary;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

pub async fn get_sources(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TicketSource>>>, ApiError> {
    let sources = TicketSource::find_all(&state.db().conn).await?;
    Ok(ResponseJson(ApiResponse::success(sources)))
}

pub async fn create_source(
    State(state): State<AppState>,
    Json(payload): Json<CreateTicketSource>,
) -> Result<ResponseJson<ApiResponse<TicketSource>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Source name is required".to_string()));
    }
    let source = TicketSource::create(&state.db().conn, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(source)))
}

pub async fn get_source_tickets(
    State(state): State<AppState>,
    Path(source_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<UploadedTicket>>>, ApiError> {
    if TicketSource::find_by_id(&state.db().conn, source_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Ticket source not found".to_string()));
    }
    let tickets = UploadedTicket::find_by_source_id(&state.db().conn, source_id).await?;
    Ok(ResponseJson(ApiResponse::success(tickets)))
}

/// The request body is the raw CSV text, not JSON.
pub async fn import_tickets(
    State(state): State<AppState>,
    Path(source_id): Path<Uuid>,
    body: String,
) -> Result<ResponseJson<ApiResponse<ImportSummary>>, ApiError> {
    if TicketSource::find_by_id(&state.db().conn, source_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Ticket source not found".to_string()));
    }
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("CSV body is empty".to_string()));
    }
    let summary = state.ingest().import_csv(source_id, &body).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sources", get(get_sources).post(create_source))
        .route("/sources/{source_id}/tickets", get(get_source_tickets))
        .route("/sources/{source_id}/import", post(import_tickets))
}
