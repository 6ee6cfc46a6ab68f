//! In-Memory Account Repository
//!
//! Process-local implementation of [`AccountRepository`] for tests and local
//! development. A single lock guards all maps so the get-or-create and verify
//! operations are atomic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{AccountRepository, StoreError, StoreResult};
use crate::models::{AccountRecord, BearerToken, NewAccount, Profile, ProfileUpdate};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, AccountRecord>,
    /// email -> account id
    emails: HashMap<String, Uuid>,
    /// token key -> token
    tokens: HashMap<String, BearerToken>,
    profiles: HashMap<Uuid, Profile>,
}

impl Tables {
    fn token_for(&self, account_id: Uuid) -> Option<&BearerToken> {
        self.tokens.values().find(|t| t.account_id == account_id)
    }
}

/// Account repository held entirely in memory
#[derive(Default)]
pub struct InMemoryAccountRepository {
    tables: RwLock<Tables>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    /// Number of stored bearer tokens
    pub async fn token_count(&self) -> usize {
        self.tables.read().await.tokens.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<AccountRecord> {
        let mut tables = self.tables.write().await;
        if tables.emails.contains_key(&account.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let record = AccountRecord {
            id: Uuid::new_v4(),
            email: account.email,
            password_hash: account.password_hash,
            is_active: account.flags.is_active,
            is_staff: account.flags.is_staff,
            is_superuser: account.flags.is_superuser,
            is_verified: account.flags.is_verified,
            created_at: now,
            updated_at: now,
        };

        tables.emails.insert(record.email.clone(), record.id);
        tables.profiles.insert(record.id, Profile::empty(record.id));
        tables.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AccountRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AccountRecord>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let record = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.password_hash = password_hash.to_string();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let record = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        if record.is_verified {
            return Ok(false);
        }
        record.is_verified = true;
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn get_or_create_bearer_token(
        &self,
        account_id: Uuid,
        candidate_key: &str,
    ) -> StoreResult<BearerToken> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound);
        }
        if let Some(existing) = tables.token_for(account_id) {
            return Ok(existing.clone());
        }

        let token = BearerToken {
            key: candidate_key.to_string(),
            account_id,
            created_at: Utc::now(),
        };
        tables.tokens.insert(token.key.clone(), token.clone());
        Ok(token)
    }

    async fn find_bearer_token(&self, key: &str) -> StoreResult<Option<BearerToken>> {
        Ok(self.tables.read().await.tokens.get(key).cloned())
    }

    async fn delete_bearer_token(&self, account_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|_, token| token.account_id != account_id);
        Ok(tables.tokens.len() != before)
    }

    async fn get_or_create_profile(&self, account_id: Uuid) -> StoreResult<Profile> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound);
        }
        let profile = tables
            .profiles
            .entry(account_id)
            .or_insert_with(|| Profile::empty(account_id));
        Ok(profile.clone())
    }

    async fn update_profile(
        &self,
        account_id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Profile> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound);
        }
        let profile = tables
            .profiles
            .entry(account_id)
            .or_insert_with(|| Profile::empty(account_id));
        profile.apply(update);
        Ok(profile.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
