//! Account Service Errors
//!
//! Error taxonomy shared by the credential, authentication, activation,
//! password and profile services, and its mapping onto [`AppError`].

use thiserror::Error;

use crate::database::StoreError;
use crate::service::token_codec::TokenError;
use crate::utils::{error::AppError, validation::messages};

/// Errors raised by the account services
#[derive(Error, Debug)]
pub enum AccountError {
    /// Field-level input problem
    #[error("Invalid {field}: {}", .messages.join(" "))]
    InvalidField {
        field: &'static str,
        messages: Vec<String>,
    },

    #[error("Email is required")]
    MissingEmail,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Superuser flags rejected: {0}")]
    InvalidSuperuserFlags(&'static str),

    /// Deliberately does not say whether the email or the password was wrong
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not verified")]
    AccountNotVerified,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(&'static str),

    #[error("Account not found")]
    UnknownAccount,

    /// A valid token names an account that no longer exists
    #[error("Token subject not found")]
    TokenSubjectMissing,

    #[error("Account already verified")]
    AlreadyVerified,

    #[error("Wrong old password")]
    WrongOldPassword,

    /// Password and its confirmation differ; carries the confirmation field name
    #[error("Passwords do not match")]
    PasswordMismatch(&'static str),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        AccountError::InvalidField {
            field,
            messages: vec![message.into()],
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AccountError::DuplicateEmail,
            StoreError::NotFound => AccountError::UnknownAccount,
            StoreError::Database(e) => AccountError::Database(e),
        }
    }
}

/// Result type for account service operations
pub type AccountResult<T> = Result<T, AccountError>;

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::ExpiredToken,
            TokenError::Malformed(_) => AppError::MalformedToken,
            TokenError::KindMismatch { expected, .. } => {
                AppError::TokenKindMismatch(format!("Expected a {} token.", expected))
            }
            TokenError::Generation(msg) => {
                AppError::Internal(format!("Token generation failed: {}", msg))
            }
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidField { field, messages } => {
                let mut fields = serde_json::Map::new();
                fields.insert(field.to_string(), serde_json::json!(messages));
                AppError::FieldErrors(serde_json::Value::Object(fields))
            }
            AccountError::MissingEmail => AppError::field("email", messages::FIELD_REQUIRED),
            AccountError::DuplicateEmail => {
                AppError::field("email", "user with this email already exists.")
            }
            AccountError::InvalidSuperuserFlags(msg) => AppError::Validation(msg.to_string()),
            AccountError::InvalidCredentials => AppError::InvalidCredentials,
            AccountError::AccountNotVerified => AppError::AccountNotVerified,
            AccountError::AccountInactive => {
                AppError::Authentication("User inactive or deleted.".to_string())
            }
            AccountError::Unauthenticated(msg) => AppError::Authentication(msg.to_string()),
            AccountError::UnknownAccount => {
                AppError::BadRequest("User does not exist.".to_string())
            }
            AccountError::TokenSubjectMissing => {
                AppError::NotFound("User does not exist.".to_string())
            }
            AccountError::AlreadyVerified => {
                AppError::BadRequest("User is already activated and verified.".to_string())
            }
            AccountError::WrongOldPassword => {
                AppError::field("old_password", messages::WRONG_PASSWORD)
            }
            AccountError::PasswordMismatch(field) => {
                AppError::field(field, messages::PASSWORDS_DO_NOT_MATCH)
            }
            AccountError::Token(e) => e.into(),
            AccountError::Database(e) => AppError::Database(e),
            AccountError::Hashing(e) => AppError::Internal(format!("Password hashing: {}", e)),
            AccountError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
