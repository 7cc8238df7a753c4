use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A startup configuration error (missing or malformed transport secret).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A malformed or forged sealed envelope.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// The presented token does not resolve in the registry.
    #[error("Invalid QR Code")]
    TokenInvalid,

    /// The token's bound session no longer exists.
    #[error("Invalid schedule")]
    SessionInvalid,

    /// The student is already on this session's ledger.
    #[error("Attendance already marked")]
    AlreadyMarked,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Returns `true` if the error is a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION)
}

impl AppError {
    /// Maps the error to an HTTP status and the summary message that may
    /// cross the service boundary. Logs the full detail here so callers
    /// never have to.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable".to_string())
            }

            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable".to_string())
            }

            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error".to_string())
            }

            AppError::Decryption(msg) => {
                tracing::warn!("Decryption error: {}", msg);
                (StatusCode::BAD_REQUEST, "Malformed encrypted payload".to_string())
            }

            AppError::TokenInvalid => {
                tracing::warn!("Redemption rejected: token not in registry");
                (StatusCode::BAD_REQUEST, "Invalid QR Code".to_string())
            }

            AppError::SessionInvalid => {
                tracing::warn!("Redemption rejected: no matching schedule");
                (StatusCode::BAD_REQUEST, "Invalid schedule".to_string())
            }

            AppError::AlreadyMarked => {
                tracing::debug!("Redemption rejected: attendance already marked");
                (StatusCode::CONFLICT, "Attendance already marked".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Validation(msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
