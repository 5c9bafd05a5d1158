//! Mapping of service errors onto client-visible `ApiError`s.
//!
//! Internal detail is logged here and never sent to the client.

use crate::domain::{ApiError, AuthError, NoteError, StoreError};
use tracing::error;

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::IdentityTaken => ApiError::conflict("identity already exists"),
            AuthError::InvalidCredentials => ApiError::unauthenticated("invalid credentials"),
            AuthError::InvalidInput(details) => ApiError::invalid_request(details),
            AuthError::IdentityMissing => {
                error!("identity record missing after successful credential verification");
                ApiError::internal()
            }
            other => {
                error!(error = %other, "credential operation failed");
                ApiError::internal()
            }
        }
    }
}

impl From<NoteError> for ApiError {
    fn from(e: NoteError) -> Self {
        match e {
            NoteError::NotFound => ApiError::not_found("note"),
            NoteError::InvalidInput(details) => ApiError::invalid_request(details),
            NoteError::IdentityMissing => {
                error!("authenticated subject has no identity record");
                ApiError::internal()
            }
            other => {
                error!(error = %other, "note operation failed");
                ApiError::internal()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "storage failure");
        ApiError::internal()
    }
}
