use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a write failure, turning unique-constraint violations into 409.
    pub fn on_unique(err: SqlxError, message: impl Into<String>) -> Self {
        match &err {
            SqlxError::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(message.into())
            }
            _ => AppError::DatabaseError(err),
        }
    }

    /// Map a write failure, turning foreign-key violations into 409.
    pub fn on_foreign_key(err: SqlxError, message: impl Into<String>) -> Self {
        match &err {
            SqlxError::Database(db) if db.is_foreign_key_violation() => {
                AppError::Conflict(message.into())
            }
            _ => AppError::DatabaseError(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::PasswordHash(_)
            | AppError::TokenSigning(_)
            | AppError::Csv(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for the client; internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m) => m.clone(),
            AppError::Unauthorized(m) => (*m).to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = match status {
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::CONFLICT => "CONFLICT",
            _ => {
                error!(error = %self, "request failed");
                "INTERNAL_ERROR"
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message: self.public_message(),
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
