//! Service Layer
//!
//! Business logic for the account lifecycle: credentials, login sessions,
//! activation, password rotation, profiles and outbound notifications.

pub mod activation;
pub mod auth;
pub mod credentials;
pub mod email_service;
pub mod error;
pub mod notification;
pub mod password_reset;
pub mod profile;
pub mod token_codec;

// Re-export services
pub use activation::{ActivationOutcome, ActivationService};
pub use auth::{AuthenticationService, JwtPair, TokenLogin};
pub use credentials::{check_password_policy, CredentialStore};
pub use email_service::{load_templates, EmailRenderer, EmailService};
pub use error::{AccountError, AccountResult};
pub use notification::{
    LinkBuilder, LogNotificationSink, Notification, NotificationDispatcher, NotificationPort,
    NotificationSink, NotificationTemplate, RecordingNotifier, RetryPolicy,
};
pub use password_reset::PasswordResetService;
pub use profile::ProfileService;
pub use token_codec::{Clock, FixedClock, SystemClock, TokenCodec, TokenError};
