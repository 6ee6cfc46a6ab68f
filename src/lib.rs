//! Account Service Library
//!
//! Account lifecycle for email-identified users: registration with emailed
//! activation, opaque bearer token and JWT pair login, password reset and
//! change, and a small profile API.
//!
//! # Features
//!
//! - **Signed Tokens**: HS256 tokens with a `kind` claim; activation, reset,
//!   access and refresh tokens are never interchangeable
//! - **Password Security**: bcrypt hashing with configurable cost factors
//! - **Anti-enumeration**: password reset requests answer identically for
//!   known and unknown emails
//! - **Fire-and-forget Email**: notifications are queued to a background
//!   worker with retry
//! - **Flexible Router**: endpoint groups selectable via RouterBuilder
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use account_service::{
//!     api::{AppState, RouterBuilder},
//!     config::TokenConfig,
//!     database::{DatabaseConfig, PgAccountRepository},
//!     service::{LinkBuilder, LogNotificationSink, NotificationDispatcher, TokenCodec},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = DatabaseConfig::from_env()?.create_migrated_pool().await?;
//!     let notifier = NotificationDispatcher::spawn(Arc::new(LogNotificationSink));
//!
//!     let state = AppState::new(
//!         Arc::new(PgAccountRepository::new(pool)),
//!         TokenCodec::new(TokenConfig::new("a-secret-of-at-least-thirty-two-bytes")),
//!         Arc::new(notifier),
//!         LinkBuilder::new("https://example.com"),
//!         12,
//!     );
//!
//!     // JWT login only, no opaque tokens
//!     let app = RouterBuilder::with_jwt_routes().build(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, authentication middleware and routes
//! - **Service Layer**: token codec, credential store and account workflows
//! - **Models**: accounts, profiles, token claims and request/response payloads
//! - **Database**: the `AccountRepository` seam with PostgreSQL and in-memory
//!   implementations
//! - **Utils**: shared error, security and validation helpers

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration management for all service settings
pub mod config;

/// Account storage: connection management and repositories
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Account lifecycle services
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{AppState, AuthUser, RouterBuilder};
pub use models::{Profile, TokenKind, UserAccount};
pub use service::{
    AccountError, ActivationService, AuthenticationService, CredentialStore,
    NotificationDispatcher, NotificationPort, PasswordResetService, ProfileService, TokenCodec,
};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{AccountRepository, DatabaseConfig, DatabasePool, PgAccountRepository};

// Re-export configuration system
pub use config::{env, AppConfig, ConfigError, EmailConfig, ServerConfig, TokenConfig};

/// Path prefix shared by every account endpoint
pub const API_PREFIX: &str = "/accounts/api/v1";

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
