//! Authentication Service
//!
//! Password login for both session schemes: opaque bearer tokens stored
//! server-side (one per account) and self-contained JWT access/refresh pairs.

use uuid::Uuid;

use crate::models::{TokenKind, UserAccount};
use crate::service::credentials::CredentialStore;
use crate::service::error::{AccountError, AccountResult};
use crate::service::token_codec::TokenCodec;
use crate::utils::security::generate_bearer_key;

/// Result of an opaque-token login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLogin {
    pub token: String,
    pub display_name: Option<String>,
    pub email: String,
}

/// Result of a JWT login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtPair {
    pub access: String,
    pub refresh: String,
    pub email: String,
    pub user_id: Uuid,
}

/// Credential checks and session issuance for both schemes
#[derive(Clone)]
pub struct AuthenticationService {
    credentials: CredentialStore,
    codec: TokenCodec,
}

impl AuthenticationService {
    pub fn new(credentials: CredentialStore, codec: TokenCodec) -> Self {
        Self { credentials, codec }
    }

    /// Checks shared by both login schemes
    async fn verified_account(&self, email: &str, password: &str) -> AccountResult<UserAccount> {
        let account = self.credentials.check_credentials(email, password).await?;
        if !account.is_verified {
            log::info!("Login refused for unverified account {}", account.id);
            return Err(AccountError::AccountNotVerified);
        }
        Ok(account)
    }

    /// Log in and return the account's opaque bearer token
    ///
    /// Repeated logins return the same token until it is revoked by logout.
    pub async fn login(&self, email: &str, password: &str) -> AccountResult<TokenLogin> {
        let account = self.verified_account(email, password).await?;
        let repository = self.credentials.repository();

        let token = repository
            .get_or_create_bearer_token(account.id, &generate_bearer_key())
            .await?;
        let profile = repository.get_or_create_profile(account.id).await?;

        log::info!("Bearer token login for account {}", account.id);
        Ok(TokenLogin {
            token: token.key,
            display_name: profile.display_name(),
            email: account.email,
        })
    }

    /// Revoke the account's bearer token
    pub async fn logout(&self, account_id: Uuid) -> AccountResult<()> {
        let deleted = self
            .credentials
            .repository()
            .delete_bearer_token(account_id)
            .await?;
        if !deleted {
            return Err(AccountError::Unauthenticated(
                "No active token for this account.",
            ));
        }

        log::info!("Bearer token revoked for account {}", account_id);
        Ok(())
    }

    /// Log in and mint an access/refresh pair
    pub async fn login_jwt(&self, email: &str, password: &str) -> AccountResult<JwtPair> {
        let account = self.verified_account(email, password).await?;

        let access = self
            .codec
            .issue_with_email(account.id, TokenKind::Access, &account.email)?;
        let refresh = self
            .codec
            .issue_with_email(account.id, TokenKind::Refresh, &account.email)?;

        log::info!("JWT pair issued for account {}", account.id);
        Ok(JwtPair {
            access,
            refresh,
            email: account.email,
            user_id: account.id,
        })
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> AccountResult<String> {
        let subject = self.codec.verify(refresh_token, TokenKind::Refresh)?;
        let account = self
            .credentials
            .find_by_id(subject)
            .await?
            .ok_or(AccountError::Unauthenticated("User not found."))?;
        if !account.is_active {
            return Err(AccountError::AccountInactive);
        }

        Ok(self
            .codec
            .issue_with_email(account.id, TokenKind::Access, &account.email)?)
    }

    /// Whether `token` carries a valid signature and has not expired
    pub fn verify(&self, token: &str) -> bool {
        self.codec.decode_any(token).is_ok()
    }

    /// Resolve `Authorization: Token <key>`
    pub async fn authenticate_bearer(&self, key: &str) -> AccountResult<UserAccount> {
        let token = self
            .credentials
            .repository()
            .find_bearer_token(key)
            .await?
            .ok_or(AccountError::Unauthenticated("Invalid token."))?;

        self.active_account(token.account_id).await
    }

    /// Resolve `Authorization: Bearer <access JWT>`
    pub async fn authenticate_access(&self, token: &str) -> AccountResult<UserAccount> {
        let subject = self
            .codec
            .verify(token, TokenKind::Access)
            .map_err(|e| {
                log::debug!("Access token rejected: {}", e);
                AccountError::Unauthenticated("Given token not valid for any token type.")
            })?;

        self.active_account(subject).await
    }

    async fn active_account(&self, account_id: Uuid) -> AccountResult<UserAccount> {
        let account = self
            .credentials
            .find_by_id(account_id)
            .await?
            .ok_or(AccountError::Unauthenticated("User not found."))?;
        if !account.is_active {
            return Err(AccountError::AccountInactive);
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenConfig;
    use crate::database::InMemoryAccountRepository;
    use crate::models::ProfileUpdate;
    use crate::service::token_codec::{FixedClock, TokenError};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    struct Fixture {
        auth: AuthenticationService,
        credentials: CredentialStore,
        repository: Arc<InMemoryAccountRepository>,
        clock: Arc<FixedClock>,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryAccountRepository::new());
        let credentials = CredentialStore::with_bcrypt_cost(repository.clone(), 4);
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let codec = TokenCodec::with_clock(TokenConfig::new(SECRET), clock.clone());
        Fixture {
            auth: AuthenticationService::new(credentials.clone(), codec),
            credentials,
            repository,
            clock,
        }
    }

    async fn verified_account(fixture: &Fixture, email: &str) -> UserAccount {
        let account = fixture
            .credentials
            .create_account(email, "Pass12345/")
            .await
            .unwrap();
        fixture.credentials.mark_verified(account.id).await.unwrap();
        account
    }

    #[tokio::test]
    async fn test_unverified_login_rejected_until_verified() {
        let f = fixture();
        let account = f
            .credentials
            .create_account("u@test.com", "Pass12345/")
            .await
            .unwrap();

        assert!(matches!(
            f.auth.login("u@test.com", "Pass12345/").await,
            Err(AccountError::AccountNotVerified)
        ));
        assert!(matches!(
            f.auth.login_jwt("u@test.com", "Pass12345/").await,
            Err(AccountError::AccountNotVerified)
        ));

        f.credentials.mark_verified(account.id).await.unwrap();
        assert!(f.auth.login("u@test.com", "Pass12345/").await.is_ok());
        assert!(f.auth.login_jwt("u@test.com", "Pass12345/").await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let f = fixture();
        verified_account(&f, "u@test.com").await;

        let wrong = f.auth.login("u@test.com", "Wrong12345/").await.unwrap_err();
        let unknown = f.auth.login("nobody@test.com", "Pass12345/").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_bearer_login_returns_same_token() {
        let f = fixture();
        let account = verified_account(&f, "u@test.com").await;
        f.credentials
            .repository()
            .update_profile(
                account.id,
                &ProfileUpdate {
                    first_name: Some("Test".into()),
                    last_name: Some("User".into()),
                    description: None,
                },
            )
            .await
            .unwrap();

        let first = f.auth.login("u@test.com", "Pass12345/").await.unwrap();
        let second = f.auth.login("u@test.com", "Pass12345/").await.unwrap();
        assert_eq!(first.token, second.token);
        assert_eq!(first.display_name.as_deref(), Some("Test User"));
        assert_eq!(first.email, "u@test.com");

        let resolved = f.auth.authenticate_bearer(&first.token).await.unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_logins_share_one_token() {
        let f = fixture();
        verified_account(&f, "u@test.com").await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let auth = f.auth.clone();
            handles.push(tokio::spawn(async move {
                auth.login("u@test.com", "Pass12345/").await
            }));
        }

        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap().unwrap().token);
        }
        assert!(tokens.iter().all(|token| token == &tokens[0]));
        assert_eq!(f.repository.token_count().await, 1);

        let resolved = f.auth.authenticate_bearer(&tokens[0]).await.unwrap();
        assert_eq!(resolved.email, "u@test.com");
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let f = fixture();
        let account = verified_account(&f, "u@test.com").await;
        let login = f.auth.login("u@test.com", "Pass12345/").await.unwrap();

        f.auth.logout(account.id).await.unwrap();
        assert!(matches!(
            f.auth.authenticate_bearer(&login.token).await,
            Err(AccountError::Unauthenticated(_))
        ));
        assert!(matches!(
            f.auth.logout(account.id).await,
            Err(AccountError::Unauthenticated(_))
        ));

        let again = f.auth.login("u@test.com", "Pass12345/").await.unwrap();
        assert_ne!(again.token, login.token);
    }

    #[tokio::test]
    async fn test_jwt_pair_and_refresh() {
        let f = fixture();
        let account = verified_account(&f, "u@test.com").await;

        let pair = f.auth.login_jwt("u@test.com", "Pass12345/").await.unwrap();
        assert_eq!(pair.user_id, account.id);
        assert_eq!(pair.email, "u@test.com");
        assert!(f.auth.verify(&pair.access));
        assert!(f.auth.verify(&pair.refresh));

        let access = f.auth.refresh(&pair.refresh).await.unwrap();
        let resolved = f.auth.authenticate_access(&access).await.unwrap();
        assert_eq!(resolved.id, account.id);

        // An access token is not a refresh token and vice versa
        assert!(matches!(
            f.auth.refresh(&pair.access).await,
            Err(AccountError::Token(TokenError::KindMismatch { .. }))
        ));
        assert!(f.auth.authenticate_access(&pair.refresh).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_tokens() {
        let f = fixture();
        verified_account(&f, "u@test.com").await;
        let pair = f.auth.login_jwt("u@test.com", "Pass12345/").await.unwrap();

        f.clock.advance(Duration::minutes(15));
        assert!(f.auth.authenticate_access(&pair.access).await.is_err());
        assert!(!f.auth.verify(&pair.access));
        assert!(f.auth.refresh(&pair.refresh).await.is_ok());

        f.clock.advance(Duration::minutes(1440));
        assert!(matches!(
            f.auth.refresh(&pair.refresh).await,
            Err(AccountError::Token(TokenError::Expired))
        ));
        assert!(!f.auth.verify("garbage"));
    }

    #[tokio::test]
    async fn test_inactive_account_rejected_by_bearer() {
        let f = fixture();
        let account = verified_account(&f, "u@test.com").await;
        let login = f.auth.login("u@test.com", "Pass12345/").await.unwrap();

        let flags = crate::models::AccountFlags {
            is_active: false,
            ..crate::models::AccountFlags::registered()
        };
        let other = f
            .credentials
            .create_account_with_flags("off@test.com", "Pass12345/", flags)
            .await
            .unwrap();
        let token = f
            .credentials
            .repository()
            .get_or_create_bearer_token(other.id, "inactive-key")
            .await
            .unwrap();

        assert!(f.auth.authenticate_bearer(&login.token).await.is_ok());
        assert!(matches!(
            f.auth.authenticate_bearer(&token.key).await,
            Err(AccountError::AccountInactive)
        ));
        assert_ne!(account.id, other.id);
    }
}
