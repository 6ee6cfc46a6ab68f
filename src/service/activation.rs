//! Activation Service
//!
//! Registration and the `Unverified -> Verified` transition driven by emailed
//! activation tokens. Verified is terminal; confirming again is a no-op.

use std::sync::Arc;

use crate::models::{TokenKind, UserAccount};
use crate::service::credentials::{check_password_policy, CredentialStore};
use crate::service::error::{AccountError, AccountResult};
use crate::service::notification::{LinkBuilder, Notification, NotificationPort};
use crate::service::token_codec::TokenCodec;

/// Result of confirming an activation token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// The account was verified before this call
    pub already_verified: bool,
}

#[derive(Clone)]
pub struct ActivationService {
    credentials: CredentialStore,
    codec: TokenCodec,
    notifier: Arc<dyn NotificationPort>,
    links: LinkBuilder,
}

impl ActivationService {
    pub fn new(
        credentials: CredentialStore,
        codec: TokenCodec,
        notifier: Arc<dyn NotificationPort>,
        links: LinkBuilder,
    ) -> Self {
        Self {
            credentials,
            codec,
            notifier,
            links,
        }
    }

    /// Create an unverified account and send its activation link
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> AccountResult<UserAccount> {
        if password != password_confirmation {
            return Err(AccountError::PasswordMismatch("password1"));
        }
        check_password_policy("password", password, Some(email))?;

        let account = self.credentials.create_account(email, password).await?;
        self.send_activation(&account)?;

        log::info!("Registered account {}", account.id);
        Ok(account)
    }

    /// Re-send the activation link to an unverified account
    pub async fn request_activation(&self, email: &str) -> AccountResult<()> {
        let account = self
            .credentials
            .find_by_email(email)
            .await?
            .ok_or(AccountError::UnknownAccount)?;
        if account.is_verified {
            return Err(AccountError::AlreadyVerified);
        }

        self.send_activation(&account)
    }

    /// Verify the account named by an activation token
    pub async fn confirm(&self, token: &str) -> AccountResult<ActivationOutcome> {
        let subject = self.codec.verify(token, TokenKind::Activation)?;
        let account = self
            .credentials
            .find_by_id(subject)
            .await?
            .ok_or(AccountError::TokenSubjectMissing)?;
        if account.is_verified {
            return Ok(ActivationOutcome {
                already_verified: true,
            });
        }

        // A concurrent confirmation may win between the read and the update
        let changed = self.credentials.mark_verified(account.id).await?;
        Ok(ActivationOutcome {
            already_verified: !changed,
        })
    }

    fn send_activation(&self, account: &UserAccount) -> AccountResult<()> {
        let token = self.codec.issue(account.id, TokenKind::Activation)?;
        self.notifier.send(Notification::activation(
            account.email.clone(),
            self.links.activation(&token),
        ));
        log::info!("Activation link dispatched for account {}", account.id);
        Ok(())
    }
}
