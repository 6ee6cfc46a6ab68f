//! Account Repository
//!
//! Storage seam for accounts, bearer tokens and profiles. Implementations must
//! make `get_or_create_bearer_token` and `mark_verified` atomic with respect
//! to concurrent callers.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccountRecord, BearerToken, NewAccount, Profile, ProfileUpdate};

/// Errors raised by repository implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint on email violated
    #[error("Email already exists")]
    DuplicateEmail,

    /// Target row does not exist
    #[error("Record not found")]
    NotFound,

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations required by the account services
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account together with an empty profile
    async fn insert_account(&self, account: NewAccount) -> StoreResult<AccountRecord>;

    /// Look up an account by its normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AccountRecord>>;

    /// Look up an account by id
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AccountRecord>>;

    /// Replace the stored password hash
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    /// Set `is_verified`; returns true only for the caller that flipped it
    async fn mark_verified(&self, id: Uuid) -> StoreResult<bool>;

    /// Return the account's bearer token, inserting `candidate_key` if none exists
    async fn get_or_create_bearer_token(
        &self,
        account_id: Uuid,
        candidate_key: &str,
    ) -> StoreResult<BearerToken>;

    /// Resolve a bearer token by key
    async fn find_bearer_token(&self, key: &str) -> StoreResult<Option<BearerToken>>;

    /// Delete the account's bearer token; returns whether one existed
    async fn delete_bearer_token(&self, account_id: Uuid) -> StoreResult<bool>;

    /// Fetch the account's profile, creating an empty one if missing
    async fn get_or_create_profile(&self, account_id: Uuid) -> StoreResult<Profile>;

    /// Apply a partial update to the account's profile
    async fn update_profile(&self, account_id: Uuid, update: &ProfileUpdate)
        -> StoreResult<Profile>;

    /// Check storage connectivity
    async fn health_check(&self) -> StoreResult<()>;
}
