//! Authentication Middleware
//!
//! Resolves the caller from the `Authorization` header. Two schemes are
//! accepted: `Token <key>` for opaque bearer tokens and `Bearer <jwt>` for
//! access tokens.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::handlers::AppState;
use crate::models::UserAccount;
use crate::utils::error::AppError;

/// How the caller authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Token <key>`
    Token,
    /// `Authorization: Bearer <access JWT>`
    Jwt,
}

/// Authenticated caller stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account: UserAccount,
    pub scheme: AuthScheme,
}

/// Split an `Authorization` header value into scheme and credential
pub fn parse_authorization(value: &str) -> Result<(AuthScheme, &str), AppError> {
    let (scheme, credential) = value
        .trim()
        .split_once(' ')
        .ok_or_else(|| AppError::Authentication("Invalid Authorization header format".into()))?;

    let credential = credential.trim();
    if credential.is_empty() || credential.contains(' ') {
        return Err(AppError::Authentication(
            "Invalid Authorization header format".into(),
        ));
    }

    match scheme {
        s if s.eq_ignore_ascii_case("token") => Ok((AuthScheme::Token, credential)),
        s if s.eq_ignore_ascii_case("bearer") => Ok((AuthScheme::Jwt, credential)),
        _ => Err(AppError::Authentication(
            "Unsupported authorization scheme".into(),
        )),
    }
}

/// Require an authenticated, active account
///
/// On success an [`AuthUser`] is added to the request extensions; otherwise
/// the request is answered with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Authentication("Authentication credentials were not provided.".into())
        })?;

    let (scheme, credential) = parse_authorization(header)?;
    let account = match scheme {
        AuthScheme::Token => state.auth.authenticate_bearer(credential).await?,
        AuthScheme::Jwt => state.auth.authenticate_access(credential).await?,
    };

    request
        .extensions_mut()
        .insert(AuthUser { account, scheme });
    Ok(next.run(request).await)
}
