//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::ProfileUpdate;
use crate::utils::validation::{email_validator, password_strength_validator};

/// Request payload for registering a new account
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegistrationRequest {
    /// Email address (must be unique and valid format)
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Password (at least 8 characters, at most 72 bytes, not numeric-only, not common)
    #[validate(custom(function = "password_strength_validator"))]
    pub password: String,

    /// Password confirmation, must equal `password`
    #[validate(length(min = 1, message = "This field is required."))]
    pub password1: String,
}

/// Response for account registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub email: String,
}

/// Request payload for re-sending the activation email
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ActivationResendRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

/// Human-readable outcome message
#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Email + password credentials used by both login schemes
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub email: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

/// Response for opaque-token login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenLoginResponse {
    /// Opaque bearer token key
    pub token: String,

    /// Profile display name, if any
    pub user: Option<String>,

    pub email: String,
}

/// Response for JWT pair creation
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtPairResponse {
    pub access: String,
    pub refresh: String,
    pub email: String,
    pub user_id: Uuid,
}

/// Request payload for refreshing an access token
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct JwtRefreshRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub refresh: String,
}

/// Response for access token refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtRefreshResponse {
    pub access: String,
}

/// Request payload for verifying any signed token
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct JwtVerifyRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub token: String,
}

/// Signature/expiry verification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVerification {
    pub valid: bool,
}

/// Request payload for changing the password of the authenticated account
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "This field is required."))]
    pub old_password: String,

    #[validate(custom(function = "password_strength_validator"))]
    pub new_password: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub new_password1: String,
}

/// Request payload for starting a password reset
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

/// Request payload for completing a password reset
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ResetPasswordConfirmRequest {
    #[validate(custom(function = "password_strength_validator"))]
    pub password: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub password1: String,
}

/// Generic success envelope for state-changing operations
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Profile of the authenticated account
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub description: String,
    pub display_name: Option<String>,
}

/// Request payload for partially updating a profile
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 250, message = "Ensure this field has no more than 250 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 250, message = "Ensure this field has no more than 250 characters."))]
    pub last_name: Option<String>,

    #[validate(length(max = 2000, message = "Ensure this field has no more than 2000 characters."))]
    pub description: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            first_name: request.first_name,
            last_name: request.last_name,
            description: request.description,
        }
    }
}

/// Response for health check
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
