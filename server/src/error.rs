//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use roomsense_core::logic::dataset::RecorderError;
use roomsense_core::logic::directory::DirectoryError;
use roomsense_core::logic::training::TrainingError;
use roomsense_core::CommandError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),
    Conflict(String),

    // Validation errors
    ValidationError(String),
    Unprocessable(String),

    // External service errors
    ExternalServiceError(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, "External service error")
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::UnknownDevice(_) => AppError::NotFound(err.to_string()),
            CommandError::InvalidRoom(e) => AppError::ValidationError(e.to_string()),
            CommandError::Recorder(e) => e.into(),
            CommandError::Training(e) => e.into(),
        }
    }
}

impl From<RecorderError> for AppError {
    fn from(err: RecorderError) -> Self {
        match &err {
            RecorderError::SchemaMismatch { .. } => AppError::Unprocessable(err.to_string()),
            RecorderError::NotGathering => AppError::Conflict(err.to_string()),
            RecorderError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                AppError::NotFound(err.to_string())
            }
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<TrainingError> for AppError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::AlreadyRunning => AppError::Conflict(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        AppError::ExternalServiceError(err.to_string())
    }
}
