//! Outbound ports for the notes API.
//!
//! Collaborators the service depends on but does not own: identity and note
//! persistence, the one-way password verifier, and the clock.

use crate::domain::{
    Identity, IdentityId, NewIdentity, NewNote, Note, NoteId, NoteUpdate, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

/// Identity persistence
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    /// Insert a new identity.
    ///
    /// Returns `StoreError::Duplicate` if the username (or a present email)
    /// is already taken.
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError>;
}

/// Note persistence. Every lookup is scoped to an owner.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, note: NewNote) -> Result<Note, StoreError>;

    async fn list_for_owner(&self, owner: IdentityId) -> Result<Vec<Note>, StoreError>;

    async fn find_for_owner(&self, id: NoteId, owner: IdentityId)
        -> Result<Option<Note>, StoreError>;

    /// Replace title (when given) and content. `None` if no such note for `owner`.
    async fn update_for_owner(
        &self,
        id: NoteId,
        owner: IdentityId,
        update: NoteUpdate,
    ) -> Result<Option<Note>, StoreError>;

    /// `true` if a note was deleted.
    async fn delete_for_owner(&self, id: NoteId, owner: IdentityId) -> Result<bool, StoreError>;
}

/// One-way password verifier. Implementations may be CPU heavy; callers run
/// them off the async executor.
pub trait PasswordHasher: Send + Sync {
    /// Produce a verifier for `password`.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// `true` iff `password` matches `verifier`.
    fn verify(&self, password: &str, verifier: &str) -> bool;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;

    /// Current time as a UTC timestamp.
    fn now_utc(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.now()).unwrap_or(i64::MAX);
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        notes_crypto::unix_now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock, for tests and replay
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub u64);

impl TimeSource for FixedTimeSource {
    fn now(&self) -> u64 {
        self.0
    }
}
