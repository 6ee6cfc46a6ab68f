//! Authentication Handlers
//!
//! Registration, activation and both login schemes (opaque token and JWT pair).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use super::handlers::AppState;
use super::middleware::AuthUser;
use crate::{
    models::requests::*,
    utils::error::{AppError, AppResult},
};

/// Register a new, unverified account and send its activation link
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> AppResult<(StatusCode, Json<RegistrationResponse>)> {
    request.validate()?;

    let account = state
        .activation
        .register(&request.email, &request.password, &request.password1)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            email: account.email,
        }),
    ))
}

/// Verify the account named by an activation token
pub async fn activation_confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DetailResponse>> {
    let outcome = state.activation.confirm(&token).await?;

    let detail = if outcome.already_verified {
        "Your account has already been verified."
    } else {
        "Your account has been verified and activated successfully."
    };
    Ok(Json(DetailResponse::new(detail)))
}

/// Re-send the activation link
pub async fn activation_resend(
    State(state): State<AppState>,
    Json(request): Json<ActivationResendRequest>,
) -> AppResult<Json<DetailResponse>> {
    request.validate()?;

    state.activation.request_activation(&request.email).await?;
    Ok(Json(DetailResponse::new(
        "Your activation code has been resent successfully.",
    )))
}

/// Exchange credentials for the account's opaque bearer token
pub async fn token_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<TokenLoginResponse>> {
    request.validate()?;

    let login = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(TokenLoginResponse {
        token: login.token,
        user: login.display_name,
        email: login.email,
    }))
}

/// Delete the caller's opaque bearer token
pub async fn token_logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<StatusCode> {
    state.auth.logout(auth_user.account.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Exchange credentials for an access/refresh JWT pair
pub async fn jwt_create(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<JwtPairResponse>> {
    request.validate()?;

    let pair = state
        .auth
        .login_jwt(&request.email, &request.password)
        .await?;
    Ok(Json(JwtPairResponse {
        access: pair.access,
        refresh: pair.refresh,
        email: pair.email,
        user_id: pair.user_id,
    }))
}

/// Mint a new access token from a refresh token
pub async fn jwt_refresh(
    State(state): State<AppState>,
    Json(request): Json<JwtRefreshRequest>,
) -> AppResult<Json<JwtRefreshResponse>> {
    request.validate()?;

    let access = state.auth.refresh(&request.refresh).await?;
    Ok(Json(JwtRefreshResponse { access }))
}

/// Check the signature and expiry of any signed token
pub async fn jwt_verify(
    State(state): State<AppState>,
    Json(request): Json<JwtVerifyRequest>,
) -> AppResult<Json<TokenVerification>> {
    request.validate()?;

    if !state.auth.verify(&request.token) {
        return Err(AppError::Authentication(
            "Token is invalid or expired".into(),
        ));
    }
    Ok(Json(TokenVerification { valid: true }))
}
