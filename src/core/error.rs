use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

/// Generic message for failures whose detail stays in the logs
pub const GENERIC_ERROR_MESSAGE: &str = "Server error. Please try again later.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// One or both attachments never reached the media host
    #[error("Upload error: {0}")]
    Upload(String),

    /// The multipart body could not be read
    #[error("Intake error: {0}")]
    Intake(String),

    /// Fetching the member list failed
    #[error("Listing error: {0}")]
    Listing(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every failure is a 500; only the message and exposed detail differ
        let (message, error) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (GENERIC_ERROR_MESSAGE.to_string(), None)
            }
            AppError::Upload(ref msg) => {
                tracing::error!("Upload error: {}", msg);
                ("Error uploading files".to_string(), Some(msg.clone()))
            }
            AppError::Intake(ref msg) => {
                tracing::error!("Intake error: {}", msg);
                (GENERIC_ERROR_MESSAGE.to_string(), None)
            }
            AppError::Listing(ref msg) => {
                tracing::error!("Listing error: {}", msg);
                ("Server Error".to_string(), Some(msg.clone()))
            }
        };

        let body = Json(ApiResponse::<()>::error(message, error));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
