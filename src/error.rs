use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::validation::ValidationErrors;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Classifies a store error raised while writing the row for `asin`.
    ///
    /// A unique-index violation means another active row holds the asin.
    pub fn from_write(error: sqlx::Error, asin: &str) -> Self {
        let unique_violation = error
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());

        if unique_violation {
            AppError::Conflict(asin.to_string())
        } else {
            AppError::Database(error)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "error": "validation failed",
                    "violations": errors,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::Conflict(asin) => {
                (StatusCode::BAD_REQUEST, format!("Error: {} already exists", asin)).into_response()
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "record not found").into_response(),
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "Store operation failed");
                let body = Json(json!({
                    "error": self.to_string()
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
