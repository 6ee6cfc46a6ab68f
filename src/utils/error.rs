//! Error Handling Utilities
//!
//! HTTP-facing error type and the JSON error envelope returned by every endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type surfaced at the HTTP boundary
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation errors for user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation errors (`field -> [messages]`)
    #[error("Validation error on fields: {0}")]
    FieldErrors(serde_json::Value),

    /// Email/password pair did not authenticate
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credentials were correct but the account has not been activated
    #[error("Account not verified")]
    AccountNotVerified,

    /// Signed token was well-formed but its expiry has passed
    #[error("Token has expired")]
    ExpiredToken,

    /// Signed token failed structural or signature checks
    #[error("Token is not valid")]
    MalformedToken,

    /// Signed token was minted for a different purpose
    #[error("Token kind mismatch: {0}")]
    TokenKindMismatch(String),

    /// Generic client error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Standard error response structure for API endpoints
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, message: &str, details: serde_json::Value) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: Some(details),
        }
    }
}

impl AppError {
    /// Build a field-level validation error with a single message
    pub fn field(field: &str, message: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), serde_json::json!([message]));
        AppError::FieldErrors(serde_json::Value::Object(fields))
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Validation(_) | AppError::FieldErrors(_) => "VALIDATION_ERROR",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::AccountNotVerified => "ACCOUNT_NOT_VERIFIED",
            AppError::ExpiredToken => "EXPIRED_TOKEN",
            AppError::MalformedToken => "INVALID_TOKEN",
            AppError::TokenKindMismatch(_) => "TOKEN_KIND_MISMATCH",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Authentication(_) => "AUTHENTICATION_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::FieldErrors(_)
            | AppError::InvalidCredentials
            | AppError::AccountNotVerified
            | AppError::ExpiredToken
            | AppError::MalformedToken
            | AppError::TokenKindMismatch(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error_response = match self {
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                ErrorResponse::new(code, "A database error occurred")
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                ErrorResponse::new(code, "An internal server error occurred")
            }
            AppError::FieldErrors(details) => {
                ErrorResponse::with_details(code, "Invalid input", details)
            }
            AppError::InvalidCredentials => {
                ErrorResponse::new(code, "Unable to log in with provided credentials.")
            }
            AppError::AccountNotVerified => {
                ErrorResponse::new(code, "User account is not verified.")
            }
            AppError::ExpiredToken => ErrorResponse::new(code, "Token has expired."),
            AppError::MalformedToken => ErrorResponse::new(code, "Token is not valid."),
            AppError::TokenKindMismatch(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::Authentication(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => ErrorResponse::new(code, &msg),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert validator failures into a field-level error map
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = serde_json::Map::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<serde_json::Value> = field_errors
                .iter()
                .map(|error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
                    serde_json::Value::String(message)
                })
                .collect();
            fields.insert(field.to_string(), serde_json::Value::Array(messages));
        }

        AppError::FieldErrors(serde_json::Value::Object(fields))
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;
