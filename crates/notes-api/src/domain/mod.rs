//! Domain types for the notes API.
//!
//! Configuration, errors, records, the request-scoped security context and
//! the role-to-permission mapping.

pub mod config;
pub mod context;
pub mod error;
pub mod permissions;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, ServiceConfig};
pub use context::SecurityContext;
pub use error::{ApiError, ApiResult, AuthError, NoteError, ServerError, StoreError};
pub use permissions::{
    permissions_for_role, permissions_for_roles, Permission, DEFAULT_ROLE, ROLE_ADMIN, ROLE_USER,
};
pub use types::*;
