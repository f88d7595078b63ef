use std::collections::BTreeMap;

use confnotes_core::Note;
use confnotes_core::NoteId;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RepositoryError;

pub const STORE_DOCUMENT_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryOperation {
    FetchAll,
    Create,
    Update,
    Delete,
}

impl RepositoryOperation {
    pub fn label(self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// On-disk shape of a note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteStoreDocument {
    pub version: u16,
    pub next_id: u64,
    pub notes: Vec<Note>,
}

impl Default for NoteStoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_DOCUMENT_VERSION,
            next_id: 1,
            notes: Vec::new(),
        }
    }
}

/// Server-side view of the notes: assigns ids and enforces existence on
/// update and delete. Shared by every repository implementation.
#[derive(Debug, Clone)]
pub struct NoteTable {
    next_id: u64,
    rows: BTreeMap<NoteId, Note>,
}

impl Default for NoteTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl NoteTable {
    pub fn seeded(notes: impl IntoIterator<Item = Note>) -> Self {
        let mut table = Self::default();
        for note in notes {
            table.insert_new(note);
        }
        table
    }

    pub fn from_document(document: NoteStoreDocument) -> Self {
        let rows: BTreeMap<NoteId, Note> = document
            .notes
            .into_iter()
            .filter(|note| !note.is_unsaved())
            .map(|note| (note.id, note))
            .collect();
        let max_id = rows.keys().map(|id| id.0).max().unwrap_or(0);
        Self {
            next_id: document.next_id.max(max_id.saturating_add(1)),
            rows,
        }
    }

    pub fn to_document(&self) -> NoteStoreDocument {
        NoteStoreDocument {
            version: STORE_DOCUMENT_VERSION,
            next_id: self.next_id,
            notes: self.rows.values().cloned().collect(),
        }
    }

    pub fn all(&self) -> Vec<Note> {
        self.rows.values().cloned().collect()
    }

    /// Stores `draft` under a fresh id; whatever id the draft carried is ignored.
    pub fn insert_new(&mut self, mut draft: Note) -> Note {
        draft.id = NoteId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.rows.insert(draft.id, draft.clone());
        draft
    }

    pub fn replace(&mut self, note: Note) -> Result<Note, RepositoryError> {
        if note.is_unsaved() {
            return Err(RepositoryError::InvalidId);
        }
        let Some(row) = self.rows.get_mut(&note.id) else {
            return Err(RepositoryError::NotFound(note.id));
        };
        *row = note.clone();
        Ok(note)
    }

    pub fn remove(&mut self, id: NoteId) -> Result<(), RepositoryError> {
        if id.is_unsaved() {
            return Err(RepositoryError::InvalidId);
        }
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
