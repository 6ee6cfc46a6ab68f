//! Database Module
//!
//! Connection management and the account repository implementations.

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repository;

// Re-export commonly used types
pub use connection::{DatabaseConfig, DatabasePool};
pub use memory::InMemoryAccountRepository;
pub use postgres::PgAccountRepository;
pub use repository::{AccountRepository, StoreError, StoreResult};
