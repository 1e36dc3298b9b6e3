//! Record store for identities and notes.
//!
//! Two traits split the store along ownership lines:
//! - `IdentityStore` is the credential store (one record per email)
//! - `NoteStore` only answers queries scoped to an owner id
//!
//! Current implementation: `JsonStore` (in memory, optionally mirrored to
//! JSON files in a data directory).

mod json;

pub use json::JsonStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Identity, IdentityId, Note, NoteChanges, NoteId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("No identity record for owner {0}")]
    UnknownOwner(IdentityId),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persists one record per identity, keyed by unique email.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create a new identity. Fails with `EmailTaken` if the email exists.
    ///
    /// `email` must already be normalized; `password_hash` is never a
    /// plaintext password.
    async fn register(&self, email: &str, password_hash: String) -> Result<Identity>;

    /// Look up an identity by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;
}

/// Keyed note records. Every query is filtered by owner inside the store.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a new note. Fails with `UnknownOwner` if `note.owner_id` has
    /// no identity record.
    async fn insert(&self, note: Note) -> Result<()>;

    /// All notes of `owner`, most recently created first.
    async fn list_owned(&self, owner: IdentityId) -> Result<Vec<Note>>;

    /// A single note, only if it belongs to `owner`.
    async fn get_owned(&self, owner: IdentityId, id: NoteId) -> Result<Option<Note>>;

    /// Apply `changes` to a note belonging to `owner`; `None` if there is no
    /// such note.
    async fn update_owned(
        &self,
        owner: IdentityId,
        id: NoteId,
        changes: NoteChanges,
    ) -> Result<Option<Note>>;

    /// Remove a note belonging to `owner`; `false` if there is no such note.
    async fn delete_owned(&self, owner: IdentityId, id: NoteId) -> Result<bool>;
}
