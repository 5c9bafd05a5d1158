//! Request-scoped security context.
//!
//! The authentication gate stores a `SecurityContext` in the request's
//! extensions. It lives exactly as long as the request; nothing here is
//! global or shared between requests.
//!
//! Handlers that need a principal take `SecurityContext` as an extractor.
//! Extraction fails with 401 when the gate installed nothing, which is where
//! protected routes enforce authentication.

use super::error::ApiError;
use super::permissions::{permissions_for_roles, Permission};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::collections::BTreeSet;

/// Authenticated principal for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    /// Token subject (username)
    pub subject: String,
    /// Role claims from the token
    pub roles: BTreeSet<String>,
}

impl SecurityContext {
    pub fn new(subject: impl Into<String>, roles: BTreeSet<String>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }

    /// Permissions granted by this context's roles.
    pub fn permissions(&self) -> BTreeSet<Permission> {
        permissions_for_roles(&self.roles)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Fail with 403 unless the roles grant `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("missing permission {permission:?}")))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SecurityContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated("authentication required"))
    }
}
