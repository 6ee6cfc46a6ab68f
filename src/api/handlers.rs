//! HTTP Request Handlers
//!
//! Shared application state and the service-level endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    database::AccountRepository,
    models::requests::HealthCheckResponse,
    service::{
        ActivationService, AuthenticationService, CredentialStore, LinkBuilder,
        NotificationPort, PasswordResetService, ProfileService, TokenCodec,
    },
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub auth: Arc<AuthenticationService>,
    pub activation: Arc<ActivationService>,
    pub password_reset: Arc<PasswordResetService>,
    pub profile: Arc<ProfileService>,
}

impl AppState {
    /// Wire every service over one repository, codec and notification port
    pub fn new(
        repository: Arc<dyn AccountRepository>,
        codec: TokenCodec,
        notifier: Arc<dyn NotificationPort>,
        links: LinkBuilder,
        bcrypt_cost: u32,
    ) -> Self {
        let credentials = CredentialStore::with_bcrypt_cost(repository, bcrypt_cost);

        Self {
            auth: Arc::new(AuthenticationService::new(credentials.clone(), codec.clone())),
            activation: Arc::new(ActivationService::new(
                credentials.clone(),
                codec.clone(),
                notifier.clone(),
                links.clone(),
            )),
            password_reset: Arc::new(PasswordResetService::new(
                credentials.clone(),
                codec,
                notifier,
                links,
            )),
            profile: Arc::new(ProfileService::new(credentials.clone())),
            credentials,
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthCheckResponse>> {
    state
        .credentials
        .repository()
        .health_check()
        .await
        .map_err(|e| AppError::Internal(format!("Storage health check failed: {}", e)))?;

    Ok(Json(HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    }))
}
