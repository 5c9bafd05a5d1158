//! Domain records and request/response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Title given to notes created without one.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Identity record id
pub type IdentityId = Uuid;

/// Note id, assigned by the note store
pub type NoteId = u64;

/// Stored identity. Owned by the persistence collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub username: String,
    pub email: Option<String>,
    /// One-way password verifier (PHC string)
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("roles", &self.roles)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Identity to be inserted at signup
#[derive(Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored note. `content` is always an encrypted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub owner: IdentityId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Note to be inserted; `content` already encrypted
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner: IdentityId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Replacement values for an existing note; `content` already encrypted
#[derive(Debug, Clone)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// Note as returned to its owner, with decrypted content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `POST /api/auth/signup` body
#[derive(Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /api/auth/login` body
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token returned by signup and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /api/notes` and `PUT /api/notes/:id` body
#[derive(Debug, Clone, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}
