/// Unified error types for Hoaxify
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the account and token lifecycle core
#[derive(Error, Debug)]
pub enum HoaxError {
    /// Bad credentials or an unresolvable bearer token
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// Correct credentials for an account that has not been activated yet
    #[error("Account is inactive")]
    AccountInactive,

    /// Uniqueness conflict on handle or email
    #[error("Already in use: {0}")]
    AlreadyInUse(String),

    /// The email gateway could not deliver a message
    #[error("Email delivery failure: {0}")]
    EmailDeliveryFailure(String),

    /// Activation token is unknown or already consumed
    #[error("Invalid activation token")]
    InvalidToken,

    /// No account is registered with the given email
    #[error("Unknown email")]
    UnknownEmail,

    /// Password reset token is unknown or already consumed
    #[error("Invalid password reset token")]
    InvalidResetToken,

    /// Attachment payload is not one of the accepted types
    #[error("Unsupported attachment type")]
    UnsupportedType,

    /// Attachment payload exceeds the configured limit
    #[error("Attachment exceeds maximum size of {limit} bytes")]
    TooLarge { limit: usize },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File store errors
    #[error("File store error: {0}")]
    FileStore(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HoaxError {
    /// Stable machine-readable kind, used as the `error` field of responses
    pub fn kind(&self) -> &'static str {
        match self {
            HoaxError::AuthenticationFailure => "AuthenticationFailure",
            HoaxError::AccountInactive => "AccountInactive",
            HoaxError::AlreadyInUse(_) => "AlreadyInUse",
            HoaxError::EmailDeliveryFailure(_) => "EmailDeliveryFailure",
            HoaxError::InvalidToken => "InvalidToken",
            HoaxError::UnknownEmail => "UnknownEmail",
            HoaxError::InvalidResetToken => "InvalidResetToken",
            HoaxError::UnsupportedType => "UnsupportedType",
            HoaxError::TooLarge { .. } => "TooLarge",
            HoaxError::NotFound(_) => "NotFound",
            HoaxError::Validation(_) => "InvalidRequest",
            HoaxError::FileStore(_)
            | HoaxError::Database(_)
            | HoaxError::Io(_)
            | HoaxError::Internal(_) => "InternalServerError",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            HoaxError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            HoaxError::AccountInactive | HoaxError::InvalidResetToken => StatusCode::FORBIDDEN,
            HoaxError::AlreadyInUse(_)
            | HoaxError::InvalidToken
            | HoaxError::UnsupportedType
            | HoaxError::TooLarge { .. }
            | HoaxError::Validation(_) => StatusCode::BAD_REQUEST,
            HoaxError::UnknownEmail | HoaxError::NotFound(_) => StatusCode::NOT_FOUND,
            HoaxError::EmailDeliveryFailure(_) => StatusCode::BAD_GATEWAY,
            HoaxError::FileStore(_)
            | HoaxError::Database(_)
            | HoaxError::Io(_)
            | HoaxError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert HoaxError to HTTP response
impl IntoResponse for HoaxError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            HoaxError::FileStore(_)
            | HoaxError::Database(_)
            | HoaxError::Io(_)
            | HoaxError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".to_string() // Don't leak details
            }
            // Delivery failures carry transport details
            HoaxError::EmailDeliveryFailure(_) => "Email delivery failure".to_string(),
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for Hoaxify operations
pub type HoaxResult<T> = Result<T, HoaxError>;

/// True when a database error is a unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
