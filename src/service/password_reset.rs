//! Password Reset Service
//!
//! Two ways to rotate a password: possession of an emailed reset token, or
//! knowledge of the current password by an authenticated caller.

use std::sync::Arc;
use uuid::Uuid;

use crate::models::TokenKind;
use crate::service::credentials::{check_password_policy, CredentialStore};
use crate::service::error::{AccountError, AccountResult};
use crate::service::notification::{LinkBuilder, Notification, NotificationPort};
use crate::service::token_codec::TokenCodec;

#[derive(Clone)]
pub struct PasswordResetService {
    credentials: CredentialStore,
    codec: TokenCodec,
    notifier: Arc<dyn NotificationPort>,
    links: LinkBuilder,
}

impl PasswordResetService {
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

    /// Send a reset link if the email belongs to an account
    ///
    /// The outcome is the same whether or not the account exists.
    pub async fn request_reset(&self, email: &str) -> AccountResult<()> {
        let Some(account) = self.credentials.find_by_email(email).await? else {
            log::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        match self.codec.issue(account.id, TokenKind::ResetPassword) {
            Ok(token) => {
                self.notifier.send(Notification::password_reset(
                    account.email.clone(),
                    self.links.password_reset(&token),
                ));
                log::info!("Password reset link dispatched for account {}", account.id);
            }
            Err(e) => log::error!("Could not issue reset token for {}: {}", account.id, e),
        }
        Ok(())
    }

    /// Set a new password using a reset token
    pub async fn confirm_reset(
        &self,
        token: &str,
        password: &str,
        password_confirmation: &str,
    ) -> AccountResult<()> {
        let subject = self.codec.verify(token, TokenKind::ResetPassword)?;
        let account = self
            .credentials
            .find_by_id(subject)
            .await?
            .ok_or(AccountError::TokenSubjectMissing)?;

        if password != password_confirmation {
            return Err(AccountError::PasswordMismatch("password1"));
        }
        check_password_policy("password", password, Some(&account.email))?;

        self.credentials.set_password(account.id, password).await
    }

    /// Rotate the password of an authenticated account
    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
        new_password_confirmation: &str,
    ) -> AccountResult<()> {
        let account = self
            .credentials
            .find_by_id(account_id)
            .await?
            .ok_or(AccountError::UnknownAccount)?;

        if new_password != new_password_confirmation {
            return Err(AccountError::PasswordMismatch("new_password1"));
        }
        check_password_policy("new_password", new_password, Some(&account.email))?;

        if !self.credentials.check_password(account.id, old_password).await? {
            log::warn!("Password change with wrong old password for {}", account.id);
            return Err(AccountError::WrongOldPassword);
        }

        self.credentials.set_password(account.id, new_password).await
    }
}
