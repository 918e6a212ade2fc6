use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use db::{
    models::{
        category::CategoryError, kanban_column::KanbanColumnError, master_mapping::MasterMappingError,
        project::ProjectError, task::TaskError, timeline_entry::TimelineError,
        uploaded_ticket::UploadedTicketError,
    },
    DbErr,
};
use services::services::{
    config::ConfigError, ingest::IngestError, kanban::KanbanError, tracker::TrackerError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Column(#[from] KanbanColumnError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    UploadedTicket(#[from] UploadedTicketError),
    #[error(transparent)]
    MasterMapping(#[from] MasterMappingError),
    #[error(transparent)]
    Kanban(#[from] KanbanError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Project(err) => match err {
                ProjectError::ProjectNotFound => (StatusCode::NOT_FOUND, "ProjectError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ProjectError"),
            },
            ApiError::Category(err) => match err {
                CategoryError::CategoryNotFound
                | CategoryError::OptionNotFound
                | CategoryError::ProjectNotFound => (StatusCode::NOT_FOUND, "CategoryError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "CategoryError"),
            },
            ApiError::Column(err) => match err {
                KanbanColumnError::ColumnNotFound | KanbanColumnError::ProjectNotFound => {
                    (StatusCode::NOT_FOUND, "ColumnError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ColumnError"),
            },
            ApiError::Task(err) => match err {
                TaskError::TaskNotFound | TaskError::ColumnNotFound => {
                    (StatusCode::NOT_FOUND, "TaskError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "TaskError"),
            },
            ApiError::Timeline(err) => match err {
                TimelineError::TaskNotFound => (StatusCode::NOT_FOUND, "TimelineError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "TimelineError"),
            },
            ApiError::UploadedTicket(err) => match err {
                UploadedTicketError::SourceNotFound => {
                    (StatusCode::NOT_FOUND, "UploadedTicketError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "UploadedTicketError"),
            },
            ApiError::MasterMapping(err) => match err {
                MasterMappingError::SourceNotFound => {
                    (StatusCode::NOT_FOUND, "MasterMappingError")
                }
                MasterMappingError::DuplicateMapping => {
                    (StatusCode::CONFLICT, "MasterMappingError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "MasterMappingError"),
            },
            ApiError::Kanban(err) => match err {
                KanbanError::TaskNotFound => (StatusCode::NOT_FOUND, "KanbanError"),
                KanbanError::Task(task_err) => match task_err {
                    TaskError::TaskNotFound | TaskError::ColumnNotFound => {
                        (StatusCode::NOT_FOUND, "KanbanError")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "KanbanError"),
                },
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "KanbanError"),
            },
            ApiError::Ingest(err) => match err {
                IngestError::SourceNotFound => (StatusCode::NOT_FOUND, "IngestError"),
                IngestError::MalformedCsv(_) => (StatusCode::BAD_REQUEST, "IngestError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "IngestError"),
            },
            ApiError::Tracker(err) => match err {
                TrackerError::NotConfigured => (StatusCode::BAD_REQUEST, "TrackerError"),
                TrackerError::InvalidBaseUrl(_) => (StatusCode::BAD_REQUEST, "TrackerError"),
                TrackerError::Upstream(_) => (StatusCode::BAD_GATEWAY, "TrackerError"),
            },
            ApiError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IoError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        let error_message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_to_expected_http_statuses() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("missing".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("already there".to_string())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(ProjectError::ProjectNotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TaskError::TaskNotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MasterMappingError::DuplicateMapping)
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(IngestError::MalformedCsv("bad header".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TrackerError::Upstream("503".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
