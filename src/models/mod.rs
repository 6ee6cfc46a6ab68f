//! Data Models Module
//!
//! Data structures used throughout the account service: accounts, profiles,
//! tokens and request/response payloads.

pub mod profile;
pub mod requests;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use profile::{Profile, ProfileUpdate};
pub use requests::*;
pub use token::{BearerToken, SignedTokenClaims, TokenKind};
pub use user::{AccountFlags, AccountRecord, NewAccount, UserAccount};
