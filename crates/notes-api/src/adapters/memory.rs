//! In-memory identity and note stores.
//!
//! Used by the default server wiring and by tests. Data does not survive a
//! restart; a database-backed store implements the same ports.
//!
//! Inspection helpers (`len`, `raw`, `overwrite_content`, ...) require the
//! `test-utils` feature.

use crate::domain::{
    Identity, IdentityId, NewIdentity, NewNote, Note, NoteId, NoteUpdate, StoreError,
};
use crate::ports::{IdentityStore, NoteStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Identities keyed by username
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove an identity. Notes owned by it are not touched.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn remove(&self, username: &str) -> Option<Identity> {
        self.identities.write().remove(username)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.read().get(username).cloned())
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut identities = self.identities.write();

        if identities.contains_key(&identity.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if let Some(email) = &identity.email {
            if identities
                .values()
                .any(|existing| existing.email.as_deref() == Some(email.as_str()))
            {
                return Err(StoreError::Duplicate("email"));
            }
        }

        let stored = Identity {
            id: Uuid::new_v4(),
            username: identity.username,
            email: identity.email,
            password_hash: identity.password_hash,
            roles: identity.roles,
            created_at: identity.created_at,
        };
        identities.insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }
}

/// Notes keyed by id, with sequential id assignment
#[derive(Debug)]
pub struct InMemoryNoteStore {
    next_id: AtomicU64,
    notes: RwLock<BTreeMap<NoteId, Note>>,
}

impl Default for InMemoryNoteStore {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            notes: RwLock::new(BTreeMap::new()),
        }
    }
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored record regardless of owner.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn raw(&self, id: NoteId) -> Option<Note> {
        self.notes.read().get(&id).cloned()
    }

    /// Overwrite the stored content blob of a note.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn overwrite_content(&self, id: NoteId, content: String) -> bool {
        match self.notes.write().get_mut(&id) {
            Some(note) => {
                note.content = content;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn insert(&self, note: NewNote) -> Result<Note, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = Note {
            id,
            owner: note.owner,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.created_at,
        };
        self.notes.write().insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_for_owner(&self, owner: IdentityId) -> Result<Vec<Note>, StoreError> {
        Ok(self
            .notes
            .read()
            .values()
            .filter(|note| note.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_for_owner(
        &self,
        id: NoteId,
        owner: IdentityId,
    ) -> Result<Option<Note>, StoreError> {
        Ok(self
            .notes
            .read()
            .get(&id)
            .filter(|note| note.owner == owner)
            .cloned())
    }

    async fn update_for_owner(
        &self,
        id: NoteId,
        owner: IdentityId,
        update: NoteUpdate,
    ) -> Result<Option<Note>, StoreError> {
        let mut notes = self.notes.write();
        let Some(note) = notes.get_mut(&id).filter(|note| note.owner == owner) else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            note.title = title;
        }
        note.content = update.content;
        note.updated_at = update.updated_at;
        Ok(Some(note.clone()))
    }

    async fn delete_for_owner(&self, id: NoteId, owner: IdentityId) -> Result<bool, StoreError> {
        let mut notes = self.notes.write();
        match notes.get(&id) {
            Some(note) if note.owner == owner => {
                notes.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn new_identity(username: &str, email: Option<&str>) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            email: email.map(String::from),
            password_hash: "$argon2id$stub".to_string(),
            roles: BTreeSet::from(["ROLE_USER".to_string()]),
            created_at: Utc::now(),
        }
    }

    fn new_note(owner: IdentityId, title: &str) -> NewNote {
        NewNote {
            owner,
            title: title.to_string(),
            content: "blob".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_identity_insert_and_find() {
        let store = InMemoryIdentityStore::new();
        let stored = store.insert(new_identity("alice", None)).await.unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, stored.id);
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let store = InMemoryIdentityStore::new();
        store
            .insert(new_identity("alice", Some("a@example.com")))
            .await
            .unwrap();

        assert!(matches!(
            store.insert(new_identity("alice", None)).await,
            Err(StoreError::Duplicate("username"))
        ));
        assert!(matches!(
            store.insert(new_identity("bob", Some("a@example.com"))).await,
            Err(StoreError::Duplicate("email"))
        ));
        assert!(store.insert(new_identity("carol", None)).await.is_ok());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_notes_scoped_to_owner() {
        let store = InMemoryNoteStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let note = store.insert(new_note(alice, "mine")).await.unwrap();
        store.insert(new_note(bob, "theirs")).await.unwrap();

        assert_eq!(store.list_for_owner(alice).await.unwrap().len(), 1);
        assert!(store.find_for_owner(note.id, bob).await.unwrap().is_none());
        assert!(!store.delete_for_owner(note.id, bob).await.unwrap());
        assert!(store.delete_for_owner(note.id, alice).await.unwrap());
        assert!(store.find_for_owner(note.id, alice).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_content() {
        let store = InMemoryNoteStore::new();
        let owner = Uuid::new_v4();
        let note = store.insert(new_note(owner, "title")).await.unwrap();

        let update = NoteUpdate {
            title: None,
            content: "new-blob".to_string(),
            updated_at: Utc::now(),
        };
        let updated = store
            .update_for_owner(note.id, owner, update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "title");
        assert_eq!(updated.content, "new-blob");

        let missing = NoteUpdate {
            title: Some("x".into()),
            content: "y".into(),
            updated_at: Utc::now(),
        };
        assert!(store
            .update_for_owner(note.id, Uuid::new_v4(), missing)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let store = InMemoryNoteStore::new();
        let owner = Uuid::new_v4();
        let first = store.insert(new_note(owner, "a")).await.unwrap();
        let second = store.insert(new_note(owner, "b")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }
}
