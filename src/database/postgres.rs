//! PostgreSQL Account Repository
//!
//! SQLx-backed implementation of [`AccountRepository`]. Uniqueness of emails
//! and of one bearer token per account is enforced by table constraints.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repository::{AccountRepository, StoreError, StoreResult};
use crate::models::{AccountRecord, BearerToken, NewAccount, Profile, ProfileUpdate};

const EMAIL_UNIQUE_CONSTRAINT: &str = "accounts_email_key";

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, is_active, is_staff, is_superuser, \
                               is_verified, created_at, updated_at";

/// Account repository backed by a Postgres pool
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for callers that need raw access
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) => {
            if db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(sqlx::Error::Database(db_err))
            }
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<AccountRecord> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            r#"
            INSERT INTO accounts (email, password_hash, is_active, is_staff, is_superuser, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.flags.is_active)
        .bind(account.flags.is_staff)
        .bind(account.flags.is_superuser)
        .bind(account.flags.is_verified)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        sqlx::query("INSERT INTO profiles (account_id) VALUES ($1)")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<AccountRecord>> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<AccountRecord>> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET is_verified = TRUE, updated_at = NOW() \
             WHERE id = $1 AND is_verified = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        match self.find_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound),
        }
    }

    async fn get_or_create_bearer_token(
        &self,
        account_id: Uuid,
        candidate_key: &str,
    ) -> StoreResult<BearerToken> {
        // A separate SELECT sees a row committed by a concurrent winner.
        sqlx::query(
            "INSERT INTO auth_tokens (key, account_id) VALUES ($1, $2) \
             ON CONFLICT (account_id) DO NOTHING",
        )
        .bind(candidate_key)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        let token = sqlx::query_as::<_, BearerToken>(
            "SELECT key, account_id, created_at FROM auth_tokens WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(token)
    }

    async fn find_bearer_token(&self, key: &str) -> StoreResult<Option<BearerToken>> {
        let token = sqlx::query_as::<_, BearerToken>(
            "SELECT key, account_id, created_at FROM auth_tokens WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn delete_bearer_token(&self, account_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_or_create_profile(&self, account_id: Uuid) -> StoreResult<Profile> {
        sqlx::query("INSERT INTO profiles (account_id) VALUES ($1) ON CONFLICT (account_id) DO NOTHING")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                // Foreign key violation: the account itself is gone
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    StoreError::NotFound
                }
                other => StoreError::Database(other),
            })?;

        let profile = sqlx::query_as::<_, Profile>(
            "SELECT account_id, first_name, last_name, description, created_at, updated_at \
             FROM profiles WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn update_profile(
        &self,
        account_id: Uuid,
        update: &ProfileUpdate,
    ) -> StoreResult<Profile> {
        self.get_or_create_profile(account_id).await?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE account_id = $1
            RETURNING account_id, first_name, last_name, description, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(update.first_name.as_deref().map(str::trim))
        .bind(update.last_name.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(profile)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
