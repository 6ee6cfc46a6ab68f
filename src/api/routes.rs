//! API Route Definitions
//!
//! All account routes live under [`API_PREFIX`](crate::API_PREFIX); the health
//! check sits at the root. The RouterBuilder allows selective enabling of
//! endpoint groups so a deployment can expose, for example, only JWT login.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::account_handlers::*;
use super::auth_handlers::*;
use super::handlers::{health_check, AppState};
use super::middleware::auth_middleware;
use crate::API_PREFIX;

/// Builder for creating API routes with configurable endpoint groups
#[derive(Debug, Default)]
pub struct RouterBuilder {
    /// GET /health
    health_check: bool,
    /// POST /registration
    registration: bool,
    /// GET /activation/confirm/{token}, POST /activation/resend
    activation: bool,
    /// POST /token/login, POST /token/logout
    token_auth: bool,
    /// POST /jwt/create, /jwt/refresh, /jwt/verify
    jwt_auth: bool,
    /// PUT /change-password, POST /reset-password, POST /reset-password/confirm/{token}
    password_management: bool,
    /// GET, PATCH /profile
    profile: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Every endpoint group enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            registration: true,
            activation: true,
            token_auth: true,
            jwt_auth: true,
            password_management: true,
            profile: true,
        }
    }

    /// Account lifecycle with opaque bearer tokens only
    pub fn with_token_routes() -> Self {
        Self {
            jwt_auth: false,
            ..Self::with_all_routes()
        }
    }

    /// Account lifecycle with JWT pairs only
    pub fn with_jwt_routes() -> Self {
        Self {
            token_auth: false,
            ..Self::with_all_routes()
        }
    }

    /// Only the health check endpoint
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    pub fn registration(mut self, enabled: bool) -> Self {
        self.registration = enabled;
        self
    }

    pub fn activation(mut self, enabled: bool) -> Self {
        self.activation = enabled;
        self
    }

    pub fn token_auth(mut self, enabled: bool) -> Self {
        self.token_auth = enabled;
        self
    }

    pub fn jwt_auth(mut self, enabled: bool) -> Self {
        self.jwt_auth = enabled;
        self
    }

    pub fn password_management(mut self, enabled: bool) -> Self {
        self.password_management = enabled;
        self
    }

    pub fn profile(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    /// Builds the router with the configured routes and binds the state
    ///
    /// Routes that need a caller identity go through [`auth_middleware`].
    pub fn build(self, state: AppState) -> Router {
        let mut public: Router<AppState> = Router::new();
        let mut protected: Router<AppState> = Router::new();
        let mut has_public = false;
        let mut has_protected = false;

        if self.registration {
            public = public.route("/registration", post(register));
            has_public = true;
        }

        if self.activation {
            public = public
                .route("/activation/confirm/{token}", get(activation_confirm))
                .route("/activation/resend", post(activation_resend));
            has_public = true;
        }

        if self.token_auth {
            public = public.route("/token/login", post(token_login));
            protected = protected.route("/token/logout", post(token_logout));
            has_public = true;
            has_protected = true;
        }

        if self.jwt_auth {
            public = public
                .route("/jwt/create", post(jwt_create))
                .route("/jwt/refresh", post(jwt_refresh))
                .route("/jwt/verify", post(jwt_verify));
            has_public = true;
        }

        if self.password_management {
            public = public
                .route("/reset-password", post(reset_password_request))
                .route(
                    "/reset-password/confirm/{token}",
                    post(reset_password_confirm),
                );
            protected = protected.route("/change-password", put(change_password));
            has_public = true;
            has_protected = true;
        }

        if self.profile {
            protected = protected.route("/profile", get(get_profile).patch(update_profile));
            has_protected = true;
        }

        let mut api: Router<AppState> = Router::new();
        if has_public {
            api = api.merge(public);
        }
        if has_protected {
            api = api.merge(protected.route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )));
        }

        let mut router: Router<AppState> = Router::new();
        if self.health_check {
            router = router.route("/health", get(health_check));
        }
        if has_public || has_protected {
            router = router.nest(API_PREFIX, api);
        }

        router.with_state(state)
    }
}

/// CORS layer for the configured origins; `*` allows any origin
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::TokenConfig;
    use crate::database::InMemoryAccountRepository;
    use crate::models::TokenKind;
    use crate::service::{CredentialStore, LinkBuilder, RecordingNotifier, TokenCodec};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    struct TestApp {
        router: Router,
        credentials: CredentialStore,
        notifier: Arc<RecordingNotifier>,
    }

    impl TestApp {
        fn new(builder: RouterBuilder) -> Self {
            let repository = Arc::new(InMemoryAccountRepository::new());
            let notifier = Arc::new(RecordingNotifier::new());
            let state = AppState::new(
                repository,
                TokenCodec::new(TokenConfig::new(SECRET)),
                notifier.clone(),
                LinkBuilder::new("http://testserver"),
                4,
            );
            Self {
                credentials: state.credentials.clone(),
                router: builder.build(state),
                notifier,
            }
        }

        async fn request(
            &self,
            method: Method,
            uri: &str,
            authorization: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(authorization) = authorization {
                builder = builder.header(header::AUTHORIZATION, authorization);
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            self.request(Method::POST, uri, None, Some(body)).await
        }

        async fn verified_account(&self, email: &str, password: &str) {
            let account = self.credentials.create_account(email, password).await.unwrap();
            self.credentials.mark_verified(account.id).await.unwrap();
        }

        async fn token_login(&self, email: &str, password: &str) -> String {
            let (status, body) = self
                .post(
                    "/accounts/api/v1/token/login",
                    json!({"email": email, "password": password}),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "login failed: {body}");
            body["token"].as_str().unwrap().to_string()
        }

        /// Path of the link carried by the most recent notification
        fn last_link_path(&self) -> String {
            let notification = self.notifier.last().unwrap();
            notification
                .link()
                .unwrap()
                .trim_start_matches("http://testserver")
                .to_string()
        }
    }

    #[test]
    fn test_router_builder_presets() {
        let builder = RouterBuilder::new();
        assert!(!builder.health_check && !builder.registration && !builder.profile);

        let all = RouterBuilder::with_all_routes();
        assert!(all.token_auth && all.jwt_auth && all.password_management && all.profile);

        let token_only = RouterBuilder::with_token_routes();
        assert!(token_only.token_auth && !token_only.jwt_auth);

        let jwt_only = RouterBuilder::with_jwt_routes();
        assert!(jwt_only.jwt_auth && !jwt_only.token_auth);

        let minimal = RouterBuilder::with_minimal_routes();
        assert!(minimal.health_check && !minimal.registration && !minimal.activation);
    }

    #[test]
    fn test_router_builder_individual_methods() {
        let builder = RouterBuilder::new()
            .health_check(true)
            .registration(true)
            .activation(false)
            .token_auth(true)
            .jwt_auth(false)
            .password_management(true)
            .profile(false);

        assert!(builder.health_check);
        assert!(builder.registration);
        assert!(!builder.activation);
        assert!(builder.token_auth);
        assert!(!builder.jwt_auth);
        assert!(builder.password_management);
        assert!(!builder.profile);
    }

    #[tokio::test]
    async fn test_cors_preflight_for_listed_origin() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        let router = app
            .router
            .clone()
            .layer(create_cors_layer(&["https://app.example.com".to_string()]));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/accounts/api/v1/token/login")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn test_health_and_disabled_routes() {
        let app = TestApp::new(RouterBuilder::with_minimal_routes());

        let (status, body) = app.request(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = app
            .post(
                "/accounts/api/v1/registration",
                json!({"email": "new@test.com", "password": "Pass12345/", "password1": "Pass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_creates_unverified_account() {
        let app = TestApp::new(RouterBuilder::with_all_routes());

        let (status, body) = app
            .post(
                "/accounts/api/v1/registration",
                json!({"email": "new@test.com", "password": "Pass12345/", "password1": "Pass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"email": "new@test.com"}));

        let account = app.credentials.find_by_email("new@test.com").await.unwrap().unwrap();
        assert!(!account.is_verified);
        assert_eq!(app.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_register_validation_errors() {
        let app = TestApp::new(RouterBuilder::with_all_routes());

        let (status, body) = app
            .post(
                "/accounts/api/v1/registration",
                json!({"email": "new@test.com", "password": "Pass12345/", "password1": "Other12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["password1"].is_array());

        let (status, body) = app
            .post("/accounts/api/v1/registration", json!({"email": "new@test.com"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["password"].is_array());

        app.post(
            "/accounts/api/v1/registration",
            json!({"email": "new@test.com", "password": "Pass12345/", "password1": "Pass12345/"}),
        )
        .await;
        let (status, body) = app
            .post(
                "/accounts/api/v1/registration",
                json!({"email": "new@test.com", "password": "Pass12345/", "password1": "Pass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["email"].is_array());
        assert_eq!(app.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_unverified_login_is_rejected() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.credentials
            .create_account("u@test.com", "Pass12345/")
            .await
            .unwrap();

        for uri in ["/accounts/api/v1/token/login", "/accounts/api/v1/jwt/create"] {
            let (status, body) = app
                .post(uri, json!({"email": "u@test.com", "password": "Pass12345/"}))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let message = body["message"].as_str().unwrap().to_lowercase();
            assert!(message.contains("not verified"), "unexpected message: {message}");
        }
    }

    #[tokio::test]
    async fn test_activation_flow_is_idempotent() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.post(
            "/accounts/api/v1/registration",
            json!({"email": "new@test.com", "password": "Pass12345/", "password1": "Pass12345/"}),
        )
        .await;
        let link = app.last_link_path();
        assert!(link.starts_with("/accounts/api/v1/activation/confirm/"));

        let (status, body) = app.request(Method::GET, &link, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["detail"],
            "Your account has been verified and activated successfully."
        );

        let (status, body) = app.request(Method::GET, &link, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["detail"], "Your account has already been verified.");

        app.token_login("new@test.com", "Pass12345/").await;

        let (status, body) = app
            .post("/accounts/api/v1/activation/resend", json!({"email": "new@test.com"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User is already activated and verified.");
    }

    #[tokio::test]
    async fn test_activation_rejects_bad_tokens() {
        let app = TestApp::new(RouterBuilder::with_all_routes());

        let (status, body) = app
            .request(
                Method::GET,
                "/accounts/api/v1/activation/confirm/not-a-token",
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_TOKEN");

        let (status, _) = app
            .post("/accounts/api/v1/activation/resend", json!({"email": "ghost@test.com"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.verified_account("u@test.com", "Pass12345/").await;
        let token = app.token_login("u@test.com", "Pass12345/").await;
        let authorization = format!("Token {token}");

        let (status, _) = app
            .request(Method::GET, "/accounts/api/v1/profile", Some(&authorization), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .request(
                Method::POST,
                "/accounts/api/v1/token/logout",
                Some(&authorization),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = app
            .request(Method::GET, "/accounts/api/v1/profile", Some(&authorization), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_routes_require_credentials() {
        let app = TestApp::new(RouterBuilder::with_all_routes());

        let (status, _) = app
            .request(Method::GET, "/accounts/api/v1/profile", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(
                Method::GET,
                "/accounts/api/v1/profile",
                Some("Basic dXNlcjpwYXNz"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .request(
                Method::GET,
                "/accounts/api/v1/profile",
                Some("Token unknown"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reset_request_does_not_reveal_accounts() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.verified_account("u@test.com", "Pass12345/").await;

        let existing = app
            .post("/accounts/api/v1/reset-password", json!({"email": "u@test.com"}))
            .await;
        assert_eq!(app.notifier.count(), 1);

        let missing = app
            .post("/accounts/api/v1/reset-password", json!({"email": "ghost@test.com"}))
            .await;
        assert_eq!(app.notifier.count(), 1);

        assert_eq!(existing.0, StatusCode::OK);
        assert_eq!(existing, missing);
    }

    #[tokio::test]
    async fn test_reset_confirm_rotates_password() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.verified_account("u@test.com", "Pass12345/").await;
        app.post("/accounts/api/v1/reset-password", json!({"email": "u@test.com"}))
            .await;
        let link = app.last_link_path();

        let (status, body) = app
            .post(
                &link,
                json!({"password": "NewPass12345/", "password1": "NewPass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "reset failed: {body}");
        assert_eq!(body["detail"], "Password reset successfully");

        app.token_login("u@test.com", "NewPass12345/").await;

        let (status, body) = app
            .post(
                "/accounts/api/v1/token/login",
                json!({"email": "u@test.com", "password": "Pass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_token_for_deleted_account_is_not_found() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        let codec = TokenCodec::new(TokenConfig::new(SECRET));
        let activation = codec.issue(Uuid::new_v4(), TokenKind::Activation).unwrap();
        let reset = codec.issue(Uuid::new_v4(), TokenKind::ResetPassword).unwrap();

        let (status, body) = app
            .request(
                Method::GET,
                &format!("/accounts/api/v1/activation/confirm/{activation}"),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");

        let (status, body) = app
            .post(
                &format!("/accounts/api/v1/reset-password/confirm/{reset}"),
                json!({"password": "NewPass12345/", "password1": "NewPass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.verified_account("u@test.com", "Pass12345/").await;
        let authorization = format!("Token {}", app.token_login("u@test.com", "Pass12345/").await);

        let (status, body) = app
            .request(
                Method::PUT,
                "/accounts/api/v1/change-password",
                Some(&authorization),
                Some(json!({
                    "old_password": "Wrong12345/",
                    "new_password": "NewPass12345/",
                    "new_password1": "NewPass12345/"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["old_password"][0], "Wrong password.");

        let (status, body) = app
            .request(
                Method::PUT,
                "/accounts/api/v1/change-password",
                Some(&authorization),
                Some(json!({
                    "old_password": "Pass12345/",
                    "new_password": "NewPass12345/",
                    "new_password1": "NewPass12345/"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        app.token_login("u@test.com", "NewPass12345/").await;
    }

    #[tokio::test]
    async fn test_profile_read_and_update_with_jwt() {
        let app = TestApp::new(RouterBuilder::with_all_routes());
        app.verified_account("u@test.com", "Pass12345/").await;

        let (status, pair) = app
            .post(
                "/accounts/api/v1/jwt/create",
                json!({"email": "u@test.com", "password": "Pass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let authorization = format!("Bearer {}", pair["access"].as_str().unwrap());

        let (status, profile) = app
            .request(Method::GET, "/accounts/api/v1/profile", Some(&authorization), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["email"], "u@test.com");
        assert_eq!(profile["user_id"], pair["user_id"]);
        assert_eq!(profile["display_name"], Value::Null);

        let (status, profile) = app
            .request(
                Method::PATCH,
                "/accounts/api/v1/profile",
                Some(&authorization),
                Some(json!({"first_name": "Ada", "last_name": "Lovelace"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["first_name"], "Ada");
        assert_eq!(profile["display_name"], "Ada Lovelace");

        let (status, body) = app
            .request(
                Method::PATCH,
                "/accounts/api/v1/profile",
                Some(&authorization),
                Some(json!({"first_name": "x".repeat(251)})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["first_name"].is_array());
    }

    #[tokio::test]
    async fn test_jwt_refresh_and_verify() {
        let app = TestApp::new(RouterBuilder::with_jwt_routes());
        app.verified_account("u@test.com", "Pass12345/").await;

        let (_, pair) = app
            .post(
                "/accounts/api/v1/jwt/create",
                json!({"email": "u@test.com", "password": "Pass12345/"}),
            )
            .await;
        assert_eq!(pair["email"], "u@test.com");

        let (status, body) = app
            .post("/accounts/api/v1/jwt/refresh", json!({"refresh": pair["refresh"]}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["access"].as_str().is_some_and(|a| !a.is_empty()));

        let (status, body) = app
            .post("/accounts/api/v1/jwt/refresh", json!({"refresh": pair["access"]}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "TOKEN_KIND_MISMATCH");

        let (status, body) = app
            .post("/accounts/api/v1/jwt/verify", json!({"token": pair["access"]}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"valid": true}));

        let (status, _) = app
            .post("/accounts/api/v1/jwt/verify", json!({"token": "garbage"}))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .post(
                "/accounts/api/v1/token/login",
                json!({"email": "u@test.com", "password": "Pass12345/"}),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
