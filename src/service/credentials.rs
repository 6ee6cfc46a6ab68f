//! Credential Store
//!
//! Owns account identity records: email normalization, password hashing,
//! verification state and the superuser flag rules.

use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::database::AccountRepository;
use crate::models::{AccountFlags, AccountRecord, NewAccount, UserAccount};
use crate::service::error::{AccountError, AccountResult};
use crate::utils::{
    security::{hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST},
    validation::{
        messages, normalize_email, password_problems, validate_email, MAX_PASSWORD_BYTES,
    },
};

/// Reject `password` for `field` if it breaks the password policy
pub fn check_password_policy(
    field: &'static str,
    password: &str,
    email: Option<&str>,
) -> AccountResult<()> {
    let problems = password_problems(password, email);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AccountError::InvalidField {
            field,
            messages: problems.into_iter().map(String::from).collect(),
        })
    }
}

/// Account identity store backed by an [`AccountRepository`]
#[derive(Clone)]
pub struct CredentialStore {
    repository: Arc<dyn AccountRepository>,

    /// bcrypt cost factor for password hashing
    bcrypt_cost: u32,

    /// Hash checked against when the email is unknown, so both paths cost one bcrypt verify
    dummy_hash: Arc<OnceLock<String>>,
}

const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

impl CredentialStore {
    pub fn new(repository: Arc<dyn AccountRepository>) -> Self {
        Self::with_bcrypt_cost(repository, DEFAULT_BCRYPT_COST)
    }

    /// Creates a store with a custom bcrypt cost (lower costs speed up tests)
    pub fn with_bcrypt_cost(repository: Arc<dyn AccountRepository>, bcrypt_cost: u32) -> Self {
        Self {
            repository,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn AccountRepository> {
        &self.repository
    }

    /// Create an active, unverified account
    pub async fn create_account(&self, email: &str, password: &str) -> AccountResult<UserAccount> {
        self.create_account_with_flags(email, password, AccountFlags::registered())
            .await
    }

    /// Create an account with explicit flags
    pub async fn create_account_with_flags(
        &self,
        email: &str,
        password: &str,
        flags: AccountFlags,
    ) -> AccountResult<UserAccount> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AccountError::MissingEmail);
        }
        if !validate_email(&email) {
            return Err(AccountError::field("email", messages::INVALID_EMAIL));
        }
        if flags.is_superuser && !flags.is_staff {
            return Err(AccountError::InvalidSuperuserFlags(
                "Superuser must have is_staff=True.",
            ));
        }

        let password_hash = self.hash(password)?;
        let record = self
            .repository
            .insert_account(NewAccount {
                email,
                password_hash,
                flags,
            })
            .await?;

        log::info!("Created account {} ({})", record.id, record.email);
        Ok(record.into())
    }

    /// Create a superuser; explicit `false` overrides are rejected
    pub async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        is_staff: Option<bool>,
        is_superuser: Option<bool>,
    ) -> AccountResult<UserAccount> {
        if is_staff == Some(false) {
            return Err(AccountError::InvalidSuperuserFlags(
                "Superuser must have is_staff=True.",
            ));
        }
        if is_superuser == Some(false) {
            return Err(AccountError::InvalidSuperuserFlags(
                "Superuser must have is_superuser=True.",
            ));
        }

        self.create_account_with_flags(email, password, AccountFlags::superuser())
            .await
    }

    /// Replace the account's password hash
    pub async fn set_password(&self, account_id: Uuid, new_password: &str) -> AccountResult<()> {
        let password_hash = self.hash(new_password)?;
        self.repository
            .update_password_hash(account_id, &password_hash)
            .await?;

        log::info!("Password rotated for account {}", account_id);
        Ok(())
    }

    /// Set `is_verified`; returns false if it was already set
    pub async fn mark_verified(&self, account_id: Uuid) -> AccountResult<bool> {
        let changed = self.repository.mark_verified(account_id).await?;
        if changed {
            log::info!("Account {} verified", account_id);
        }
        Ok(changed)
    }

    pub async fn find_by_email(&self, email: &str) -> AccountResult<Option<UserAccount>> {
        Ok(self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .map(UserAccount::from))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AccountResult<Option<UserAccount>> {
        Ok(self.repository.find_by_id(id).await?.map(UserAccount::from))
    }

    /// Check an email/password pair
    ///
    /// Unknown emails, wrong passwords and inactive accounts all yield
    /// `InvalidCredentials`. Verification state is left to the caller.
    pub async fn check_credentials(&self, email: &str, password: &str) -> AccountResult<UserAccount> {
        let Some(record) = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
        else {
            verify_password(password, self.dummy_hash()?)?;
            return Err(AccountError::InvalidCredentials);
        };

        if !self.password_matches(&record, password)? || !record.is_active {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(record.into())
    }

    /// Whether `password` matches the stored hash of `account_id`
    pub async fn check_password(&self, account_id: Uuid, password: &str) -> AccountResult<bool> {
        let record = self
            .repository
            .find_by_id(account_id)
            .await?
            .ok_or(AccountError::UnknownAccount)?;
        self.password_matches(&record, password)
    }

    fn password_matches(&self, record: &AccountRecord, password: &str) -> AccountResult<bool> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        Ok(verify_password(password, &record.password_hash)?)
    }

    /// bcrypt only reads the first 72 bytes, so longer input is refused rather than truncated
    fn hash(&self, password: &str) -> AccountResult<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AccountError::field("password", messages::PASSWORD_TOO_LONG));
        }
        Ok(hash_password_with_cost(password, self.bcrypt_cost)?)
    }

    fn dummy_hash(&self) -> AccountResult<&str> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash);
        }
        let hash = hash_password_with_cost(DUMMY_PASSWORD, self.bcrypt_cost)?;
        Ok(self.dummy_hash.get_or_init(|| hash))
    }
}
