//! Profile Service
//!
//! Read and partially update the profile of an account.

use uuid::Uuid;

use crate::models::{Profile, ProfileUpdate, UserAccount};
use crate::service::credentials::CredentialStore;
use crate::service::error::{AccountError, AccountResult};

#[derive(Clone)]
pub struct ProfileService {
    credentials: CredentialStore,
}

impl ProfileService {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// Fetch the account together with its profile
    pub async fn get(&self, account_id: Uuid) -> AccountResult<(UserAccount, Profile)> {
        let account = self
            .credentials
            .find_by_id(account_id)
            .await?
            .ok_or(AccountError::UnknownAccount)?;
        let profile = self
            .credentials
            .repository()
            .get_or_create_profile(account_id)
            .await?;
        Ok((account, profile))
    }

    pub async fn update(
        &self,
        account_id: Uuid,
        update: &ProfileUpdate,
    ) -> AccountResult<(UserAccount, Profile)> {
        let account = self
            .credentials
            .find_by_id(account_id)
            .await?
            .ok_or(AccountError::UnknownAccount)?;
        let profile = self
            .credentials
            .repository()
            .update_profile(account_id, update)
            .await?;

        log::info!("Profile updated for account {}", account_id);
        Ok((account, profile))
    }
}
