//! In-memory record store with optional JSON persistence

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{IdentityStore, NoteStore, Result, StoreError};
use crate::model::{Identity, IdentityId, Note, NoteChanges, NoteId};

const IDENTITIES_FILE: &str = "identities.json";
const NOTES_FILE: &str = "notes.json";

/// Record store backing both identities and notes
pub struct JsonStore {
    /// Directory holding the JSON tables (None = memory only)
    data_path: Option<PathBuf>,
    identities: RwLock<IdentityTable>,
    notes: RwLock<NoteTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct IdentityTable {
    identities: Vec<Identity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct NoteTable {
    /// Kept in creation order
    notes: Vec<Note>,
}

impl JsonStore {
    /// Create a store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            data_path: None,
            identities: RwLock::new(IdentityTable::default()),
            notes: RwLock::new(NoteTable::default()),
        }
    }

    /// Open (or create) a store persisted under `data_path`
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let identities: IdentityTable = load_table(&data_path.join(IDENTITIES_FILE))?;
        let notes: NoteTable = load_table(&data_path.join(NOTES_FILE))?;

        tracing::info!(
            "Loaded {} identities and {} notes from {:?}",
            identities.identities.len(),
            notes.notes.len(),
            data_path
        );

        Ok(Self {
            data_path: Some(data_path),
            identities: RwLock::new(identities),
            notes: RwLock::new(notes),
        })
    }

    fn read_identities(&self) -> Result<RwLockReadGuard<'_, IdentityTable>> {
        self.identities.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_identities(&self) -> Result<RwLockWriteGuard<'_, IdentityTable>> {
        self.identities.write().map_err(|_| StoreError::Poisoned)
    }

    fn read_notes(&self) -> Result<RwLockReadGuard<'_, NoteTable>> {
        self.notes.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_notes(&self) -> Result<RwLockWriteGuard<'_, NoteTable>> {
        self.notes.write().map_err(|_| StoreError::Poisoned)
    }

    /// Mirror a table to disk. Callers hold the table's write lock so
    /// concurrent mutations reach the file in the order they were applied.
    fn persist<T: Serialize>(&self, file: &str, table: &T) -> Result<()> {
        let Some(dir) = &self.data_path else {
            return Ok(());
        };
        let path = dir.join(file);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(table)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn has_identity(&self, id: IdentityId) -> Result<bool> {
        Ok(self.read_identities()?.identities.iter().any(|i| i.id == id))
    }
}

fn load_table<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[async_trait]
impl IdentityStore for JsonStore {
    async fn register(&self, email: &str, password_hash: String) -> Result<Identity> {
        let mut table = self.write_identities()?;
        if table.identities.iter().any(|i| i.email == email) {
            return Err(StoreError::EmailTaken(email.to_string()));
        }

        let identity = Identity {
            id: IdentityId::generate(),
            email: email.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        table.identities.push(identity.clone());

        if let Err(e) = self.persist(IDENTITIES_FILE, &*table) {
            table.identities.pop();
            return Err(e);
        }
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let table = self.read_identities()?;
        Ok(table.identities.iter().find(|i| i.email == email).cloned())
    }
}

#[async_trait]
impl NoteStore for JsonStore {
    async fn insert(&self, note: Note) -> Result<()> {
        if !self.has_identity(note.owner_id)? {
            return Err(StoreError::UnknownOwner(note.owner_id));
        }

        let mut table = self.write_notes()?;
        table.notes.push(note);

        if let Err(e) = self.persist(NOTES_FILE, &*table) {
            table.notes.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn list_owned(&self, owner: IdentityId) -> Result<Vec<Note>> {
        let table = self.read_notes()?;
        Ok(table
            .notes
            .iter()
            .rev()
            .filter(|n| n.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn get_owned(&self, owner: IdentityId, id: NoteId) -> Result<Option<Note>> {
        let table = self.read_notes()?;
        Ok(table
            .notes
            .iter()
            .find(|n| n.id == id && n.owner_id == owner)
            .cloned())
    }

    async fn update_owned(
        &self,
        owner: IdentityId,
        id: NoteId,
        changes: NoteChanges,
    ) -> Result<Option<Note>> {
        let mut table = self.write_notes()?;
        let Some(index) = table
            .notes
            .iter()
            .position(|n| n.id == id && n.owner_id == owner)
        else {
            return Ok(None);
        };

        let previous = table.notes[index].clone();
        table.notes[index].apply(changes);

        if let Err(e) = self.persist(NOTES_FILE, &*table) {
            table.notes[index] = previous;
            return Err(e);
        }
        Ok(Some(table.notes[index].clone()))
    }

    async fn delete_owned(&self, owner: IdentityId, id: NoteId) -> Result<bool> {
        let mut table = self.write_notes()?;
        let Some(index) = table
            .notes
            .iter()
            .position(|n| n.id == id && n.owner_id == owner)
        else {
            return Ok(false);
        };

        let removed = table.notes.remove(index);

        if let Err(e) = self.persist(NOTES_FILE, &*table) {
            table.notes.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }
}
