//! API Layer
//!
//! HTTP endpoints for the account lifecycle, the authentication middleware
//! and the configurable router.

pub mod account_handlers;
pub mod auth_handlers;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use handlers::AppState;
pub use middleware::{auth_middleware, AuthScheme, AuthUser};
pub use routes::RouterBuilder;
