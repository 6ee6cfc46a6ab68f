//! User Account Model
//!
//! Core account data structures and type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account representation for external API responses and service callers
///
/// This struct never carries the password hash. All datetime fields use UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Unique identifier for the account
    pub id: Uuid,

    /// Normalized email address (unique)
    pub email: String,

    /// Whether the account may authenticate at all
    pub is_active: bool,

    /// Whether the account may access staff tooling
    pub is_staff: bool,

    /// Whether the account holds every permission
    pub is_superuser: bool,

    /// Whether the email address has been confirmed through activation
    pub is_verified: bool,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// Stored account row including the password hash
///
/// Used by the persistence layer and credential checks only; it is converted
/// into [`UserAccount`] before leaving the service layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: String,

    /// bcrypt password hash
    pub password_hash: String,

    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountRecord> for UserAccount {
    /// Strip the password hash so it is never exposed past the service layer
    fn from(record: AccountRecord) -> Self {
        UserAccount {
            id: record.id,
            email: record.email,
            is_active: record.is_active,
            is_staff: record.is_staff,
            is_superuser: record.is_superuser,
            is_verified: record.is_verified,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Permission and lifecycle flags set at account creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFlags {
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl AccountFlags {
    /// Flags for a freshly registered account: active, unverified, no privileges
    pub fn registered() -> Self {
        Self {
            is_active: true,
            is_staff: false,
            is_superuser: false,
            is_verified: false,
        }
    }

    /// Flags for a superuser: everything enabled
    pub fn superuser() -> Self {
        Self {
            is_active: true,
            is_staff: true,
            is_superuser: true,
            is_verified: true,
        }
    }
}

impl Default for AccountFlags {
    fn default() -> Self {
        Self::registered()
    }
}

/// Insert payload handed to the repository
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Already normalized email
    pub email: String,

    /// Already hashed password
    pub password_hash: String,

    pub flags: AccountFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_record_conversion_drops_hash() {
        let record = AccountRecord {
            id: Uuid::new_v4(),
            email: "u@test.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let account: UserAccount = record.clone().into();
        assert_eq!(account.id, record.id);
        assert_eq!(account.email, "u@test.com");

        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_registered_flags() {
        let flags = AccountFlags::registered();
        assert!(flags.is_active);
        assert!(!flags.is_verified);
        assert!(!flags.is_staff && !flags.is_superuser);
        assert_eq!(AccountFlags::default(), flags);
    }

    #[test]
    fn test_superuser_flags() {
        let flags = AccountFlags::superuser();
        assert!(flags.is_active && flags.is_verified && flags.is_staff && flags.is_superuser);
    }
}
