//! Configuration Module
//!
//! Centralized configuration for the account service: server binding, database
//! pool, signed token lifetimes, password hashing and outbound email.

use chrono::Duration;
use std::time::Duration as StdDuration;
use thiserror::Error;

use crate::database::DatabaseConfig;
use crate::models::TokenKind;
use crate::utils::security::DEFAULT_BCRYPT_COST;

/// Minimum accepted length of the token signing secret, in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Configuration loading and validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,

    /// SMTP delivery; `None` means notifications are only logged
    pub email: Option<EmailConfig>,

    /// Prefix for links placed in activation and reset emails
    pub public_base_url: String,

    pub bcrypt_cost: u32,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Signing secret and per-kind lifetimes for signed tokens
#[derive(Clone)]
pub struct TokenConfig {
    /// HS256 secret shared by every token kind
    pub secret: String,
    pub activation_lifetime: Duration,
    pub reset_password_lifetime: Duration,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

/// SMTP configuration for the email notification sink
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 3000),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("activation_lifetime", &self.activation_lifetime)
            .field("reset_password_lifetime", &self.reset_password_lifetime)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}

impl TokenConfig {
    /// Default lifetimes with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            activation_lifetime: Duration::minutes(60),
            reset_password_lifetime: Duration::minutes(15),
            access_lifetime: Duration::minutes(15),
            refresh_lifetime: Duration::minutes(1440),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::get_required("TOKEN_SECRET")?,
            activation_lifetime: Duration::minutes(env::get_i64("ACTIVATION_TOKEN_MINUTES", 60)),
            reset_password_lifetime: Duration::minutes(env::get_i64("RESET_TOKEN_MINUTES", 15)),
            access_lifetime: Duration::minutes(env::get_i64("ACCESS_TOKEN_MINUTES", 15)),
            refresh_lifetime: Duration::minutes(env::get_i64("REFRESH_TOKEN_MINUTES", 1440)),
        })
    }

    /// Configured lifetime for tokens of `kind`
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Activation => self.activation_lifetime,
            TokenKind::ResetPassword => self.reset_password_lifetime,
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "TOKEN_SECRET must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }

        let kinds = [
            TokenKind::Activation,
            TokenKind::ResetPassword,
            TokenKind::Access,
            TokenKind::Refresh,
        ];
        if let Some(kind) = kinds.iter().find(|k| self.lifetime(**k) <= Duration::zero()) {
            return Err(ConfigError::Invalid(format!(
                "{} token lifetime must be positive",
                kind
            )));
        }

        Ok(())
    }
}

impl EmailConfig {
    /// SMTP settings, or `None` when `SMTP_HOST` is unset
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        if !env::is_set("SMTP_HOST") {
            return Ok(None);
        }

        Ok(Some(Self {
            smtp_host: env::get_required("SMTP_HOST")?,
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_username: env::get_required("SMTP_USERNAME")?,
            smtp_password: env::get_required("SMTP_PASSWORD")?,
            from_email: env::get_required("FROM_EMAIL")?,
            from_name: env::get_string("FROM_NAME", "Account Service"),
        }))
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::get_required("DATABASE_URL")?,
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 10),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout: StdDuration::from_secs(env::get_u64("DB_CONNECT_TIMEOUT", 10)),
            idle_timeout: StdDuration::from_secs(env::get_u64("DB_IDLE_TIMEOUT", 600)),
            max_lifetime: StdDuration::from_secs(env::get_u64("DB_MAX_LIFETIME", 3600)),
        })
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::from_env()?,
            tokens: TokenConfig::from_env()?,
            email: EmailConfig::from_env()?,
            public_base_url: env::get_string("PUBLIC_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            bcrypt_cost: env::get_u32("BCRYPT_COST", DEFAULT_BCRYPT_COST),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "Server port must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".into(),
            ));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "BCRYPT_COST must be between 4 and 31".into(),
            ));
        }

        self.tokens.validate()
    }
}
