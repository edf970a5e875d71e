use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::system::storage::ErrorResponse;
use thiserror::Error;

/// Ошибки HTTP-обработчиков; текст уходит клиенту в `{"error": ...}`,
/// подробности пишутся в лог на месте возникновения.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Missing key")]
    MissingKey,

    #[error("Invalid key")]
    InvalidKey,

    #[error("Upload failed")]
    UploadFailed,

    #[error("File too large")]
    TooLarge,

    #[error("Failed to get URL")]
    SignFailed,

    #[error("Delete failed")]
    DeleteFailed,

    #[error("Invalid or expired signature")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Failed to read file")]
    ReadFailed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::MissingKey | ApiError::InvalidKey => {
                StatusCode::BAD_REQUEST
            }
            ApiError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::UploadFailed
            | ApiError::SignFailed
            | ApiError::DeleteFailed
            | ApiError::ReadFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
