//! Owner-scoped access to notes.
//!
//! `OwnedNotes` is the only pathway to the note store. Every method takes the
//! caller as an [`Authenticated`], which only the session gate produces, so
//! the owner id always comes from a verified token and never from request
//! data. A note owned by someone else is reported exactly like a missing one.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::model::{Note, NoteChanges, NoteId};
use crate::storage::NoteStore;

pub struct OwnedNotes {
    store: Arc<dyn NoteStore>,
}

impl OwnedNotes {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// The caller's notes, most recently created first.
    pub async fn list(&self, caller: &Authenticated) -> Result<Vec<Note>, ApiError> {
        Ok(self.store.list_owned(caller.id()).await?)
    }

    pub async fn get(&self, caller: &Authenticated, note_id: &str) -> Result<Note, ApiError> {
        let id = parse_note_id(note_id)?;
        self.store
            .get_owned(caller.id(), id)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn create(
        &self,
        caller: &Authenticated,
        title: &str,
        content: &str,
        tags: Option<Vec<String>>,
    ) -> Result<Note, ApiError> {
        require_text("title", title)?;
        require_text("content", content)?;

        let now = Utc::now();
        let note = Note {
            id: NoteId::generate(),
            owner_id: caller.id(),
            title: title.to_string(),
            content: content.to_string(),
            tags: clean_tags(tags.unwrap_or_default()),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(note.clone()).await?;

        tracing::debug!("Identity {} created note {}", caller.id(), note.id);
        Ok(note)
    }

    pub async fn update(
        &self,
        caller: &Authenticated,
        note_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Note, ApiError> {
        let id = parse_note_id(note_id)?;
        require_text("title", title)?;
        require_text("content", content)?;

        let changes = NoteChanges {
            title: title.to_string(),
            content: content.to_string(),
            updated_at: Utc::now(),
        };
        let note = self
            .store
            .update_owned(caller.id(), id, changes)
            .await?
            .ok_or(ApiError::NotFound)?;

        tracing::debug!("Identity {} updated note {}", caller.id(), note.id);
        Ok(note)
    }

    pub async fn delete(&self, caller: &Authenticated, note_id: &str) -> Result<(), ApiError> {
        let id = parse_note_id(note_id)?;
        if !self.store.delete_owned(caller.id(), id).await? {
            return Err(ApiError::NotFound);
        }

        tracing::debug!("Identity {} deleted note {}", caller.id(), id);
        Ok(())
    }
}

/// An id that cannot name any note is just another missing note.
fn parse_note_id(raw: &str) -> Result<NoteId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
