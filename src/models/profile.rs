//! Profile Model
//!
//! Display information stored alongside each account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-to-one companion of an account holding display name fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Owning account
    pub account_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile for a new account
    pub fn empty(account_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            first_name: String::new(),
            last_name: String::new(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// "first last", or None when both names are blank
    pub fn display_name(&self) -> Option<String> {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            None
        } else {
            Some(full.to_string())
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(first_name) = &update.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &update.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Partial profile update; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut profile = Profile::empty(Uuid::new_v4());
        assert_eq!(profile.display_name(), None);

        profile.first_name = "John".into();
        assert_eq!(profile.display_name().as_deref(), Some("John"));

        profile.last_name = "Doe".into();
        assert_eq!(profile.display_name().as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_apply_partial_update() {
        let mut profile = Profile::empty(Uuid::new_v4());
        profile.last_name = "Keep".into();

        profile.apply(&ProfileUpdate {
            first_name: Some("  Updated ".into()),
            ..Default::default()
        });

        assert_eq!(profile.first_name, "Updated");
        assert_eq!(profile.last_name, "Keep");
        assert!(profile.updated_at >= profile.created_at);
    }
}
