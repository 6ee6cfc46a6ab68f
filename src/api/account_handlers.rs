//! Account Handlers
//!
//! Password rotation and profile endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use validator::Validate;

use super::handlers::AppState;
use super::middleware::AuthUser;
use crate::{
    models::{requests::*, Profile, UserAccount},
    utils::error::AppResult,
};

/// Change the password of the authenticated account
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<Json<StatusResponse>> {
    request.validate()?;

    state
        .password_reset
        .change_password(
            auth_user.account.id,
            &request.old_password,
            &request.new_password,
            &request.new_password1,
        )
        .await?;

    Ok(Json(StatusResponse::success("Password updated successfully")))
}

/// Start a password reset
///
/// Answers identically whether or not the email belongs to an account.
pub async fn reset_password_request(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<DetailResponse>> {
    request.validate()?;

    state.password_reset.request_reset(&request.email).await?;
    Ok(Json(DetailResponse::new(
        "If the email exists, a reset link has been sent.",
    )))
}

/// Complete a password reset with the emailed token
pub async fn reset_password_confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordConfirmRequest>,
) -> AppResult<Json<DetailResponse>> {
    request.validate()?;

    state
        .password_reset
        .confirm_reset(&token, &request.password, &request.password1)
        .await?;
    Ok(Json(DetailResponse::new("Password reset successfully")))
}

/// Profile of the authenticated account
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ProfileResponse>> {
    let (account, profile) = state.profile.get(auth_user.account.id).await?;
    Ok(Json(profile_response(account, profile)))
}

/// Partially update the profile of the authenticated account
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    request.validate()?;

    let (account, profile) = state
        .profile
        .update(auth_user.account.id, &request.into())
        .await?;
    Ok(Json(profile_response(account, profile)))
}

fn profile_response(account: UserAccount, profile: Profile) -> ProfileResponse {
    ProfileResponse {
        user_id: account.id,
        email: account.email,
        display_name: profile.display_name(),
        first_name: profile.first_name,
        last_name: profile.last_name,
        description: profile.description,
    }
}
