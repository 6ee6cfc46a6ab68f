//! Token Models
//!
//! Signed token claims, the kind discriminator and stored bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Purpose a signed token was minted for
///
/// Serialized into the `type` claim and checked on every decode so a token
/// minted for one flow cannot be replayed in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Activation,
    ResetPassword,
    Refresh,
    Access,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Activation => "activation",
            TokenKind::ResetPassword => "reset_password",
            TokenKind::Refresh => "refresh",
            TokenKind::Access => "access",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims shared by every token kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTokenClaims {
    /// Subject - account ID
    pub sub: String,

    /// Token kind discriminator
    #[serde(rename = "type")]
    pub kind: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    /// Account email, carried on access/refresh tokens for client convenience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SignedTokenClaims {
    /// Create new claims for `subject` valid between `issued_at` and `expires_at`
    pub fn new(
        subject: Uuid,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            kind,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            email: None,
        }
    }

    /// Attach the account email claim
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Parse the subject claim as an account id
    pub fn subject_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Opaque bearer token stored server-side, at most one per account
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BearerToken {
    /// Random opaque key presented as `Authorization: Token <key>`
    pub key: String,

    /// Owning account
    pub account_id: Uuid,

    /// When the token was first issued
    pub created_at: DateTime<Utc>,
}
