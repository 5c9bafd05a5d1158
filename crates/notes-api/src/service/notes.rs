//! Owner-scoped note management.
//!
//! Content is encrypted before it reaches the store and decrypted only on the
//! way back to its owner. Titles are stored in the clear.

use crate::domain::{
    IdentityId, NewNote, Note, NoteError, NoteId, NoteUpdate, NoteView, DEFAULT_NOTE_TITLE,
};
use crate::ports::{IdentityStore, NoteStore, TimeSource};
use notes_crypto::EncryptionCodec;
use std::sync::Arc;
use tracing::{debug, error};

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

pub struct NoteService {
    notes: Arc<dyn NoteStore>,
    identities: Arc<dyn IdentityStore>,
    cipher: Arc<EncryptionCodec>,
    clock: Arc<dyn TimeSource>,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        identities: Arc<dyn IdentityStore>,
        cipher: Arc<EncryptionCodec>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            notes,
            identities,
            cipher,
            clock,
        }
    }

    /// Create a note for `subject`. A missing title becomes "Untitled Note".
    pub async fn create(
        &self,
        subject: &str,
        title: Option<String>,
        content: &str,
    ) -> Result<NoteView, NoteError> {
        let owner = self.owner_id(subject).await?;
        let title = validate_title(title)?.unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string());

        let note = self
            .notes
            .insert(NewNote {
                owner,
                title,
                content: self.cipher.encrypt(content)?,
                created_at: self.clock.now_utc(),
            })
            .await?;

        debug!(note_id = note.id, "note created");
        Ok(NoteView {
            id: note.id,
            title: note.title,
            content: content.to_string(),
            created_at: note.created_at,
            updated_at: note.updated_at,
        })
    }

    /// All notes owned by `subject`, decrypted.
    pub async fn list(&self, subject: &str) -> Result<Vec<NoteView>, NoteError> {
        let owner = self.owner_id(subject).await?;
        self.notes
            .list_for_owner(owner)
            .await?
            .into_iter()
            .map(|note| self.view(note))
            .collect()
    }

    pub async fn get(&self, subject: &str, id: NoteId) -> Result<NoteView, NoteError> {
        let owner = self.owner_id(subject).await?;
        let note = self
            .notes
            .find_for_owner(id, owner)
            .await?
            .ok_or(NoteError::NotFound)?;
        self.view(note)
    }

    /// Replace a note's content (re-encrypted as a whole) and, when given, its title.
    pub async fn update(
        &self,
        subject: &str,
        id: NoteId,
        title: Option<String>,
        content: &str,
    ) -> Result<NoteView, NoteError> {
        let owner = self.owner_id(subject).await?;
        let update = NoteUpdate {
            title: validate_title(title)?,
            content: self.cipher.encrypt(content)?,
            updated_at: self.clock.now_utc(),
        };

        let note = self
            .notes
            .update_for_owner(id, owner, update)
            .await?
            .ok_or(NoteError::NotFound)?;

        debug!(note_id = note.id, "note updated");
        Ok(NoteView {
            id: note.id,
            title: note.title,
            content: content.to_string(),
            created_at: note.created_at,
            updated_at: note.updated_at,
        })
    }

    pub async fn delete(&self, subject: &str, id: NoteId) -> Result<(), NoteError> {
        let owner = self.owner_id(subject).await?;
        if self.notes.delete_for_owner(id, owner).await? {
            debug!(note_id = id, "note deleted");
            Ok(())
        } else {
            Err(NoteError::NotFound)
        }
    }

    async fn owner_id(&self, subject: &str) -> Result<IdentityId, NoteError> {
        self.identities
            .find_by_username(subject)
            .await?
            .map(|identity| identity.id)
            .ok_or(NoteError::IdentityMissing)
    }

    fn view(&self, note: Note) -> Result<NoteView, NoteError> {
        let content = self.cipher.decrypt(&note.content).map_err(|e| {
            error!(note_id = note.id, error = %e, "stored note content failed to decrypt");
            e
        })?;
        Ok(NoteView {
            id: note.id,
            title: note.title,
            content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        })
    }
}

fn validate_title(title: Option<String>) -> Result<Option<String>, NoteError> {
    match title {
        Some(title) if title.chars().count() > MAX_TITLE_CHARS => Err(NoteError::InvalidInput(
            format!("title longer than {MAX_TITLE_CHARS} characters"),
        )),
        other => Ok(other),
    }
}
