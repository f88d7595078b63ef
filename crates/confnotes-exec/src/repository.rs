use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use confnotes_core::Note;
use confnotes_core::NoteId;
use tracing::instrument;

use crate::contracts::NoteTable;
use crate::contracts::RepositoryOperation;
use crate::error::RepositoryError;

/// Remote note service. Calls block; the shell runs them off the event loop.
pub trait NoteRepository: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch_all(&self) -> Result<Vec<Note>, RepositoryError>;
    fn create(&self, draft: Note) -> Result<Note, RepositoryError>;
    fn update(&self, note: Note) -> Result<Note, RepositoryError>;
    fn delete(&self, id: NoteId) -> Result<(), RepositoryError>;
}

/// Queued one-shot failures, consumed by the next call of the matching operation.
#[derive(Debug, Default)]
pub struct FaultPlan {
    queued: Mutex<HashMap<RepositoryOperation, Vec<String>>>,
}

impl FaultPlan {
    pub fn fail_next(&self, operation: RepositoryOperation, message: impl Into<String>) {
        self.queue().entry(operation).or_default().push(message.into());
    }

    pub fn check(&self, operation: RepositoryOperation) -> Result<(), RepositoryError> {
        match self.queue().get_mut(&operation) {
            Some(messages) if !messages.is_empty() => {
                let message = messages.remove(0);
                Err(RepositoryError::Injected(operation, message))
            }
            _ => Ok(()),
        }
    }

    // Every update to the queue is a single push or remove, so a panic while
    // holding the lock cannot leave it half-written.
    fn queue(&self) -> MutexGuard<'_, HashMap<RepositoryOperation, Vec<String>>> {
        self.queued.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNoteRepository {
    table: Mutex<NoteTable>,
    faults: FaultPlan,
}

impl InMemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(notes: impl IntoIterator<Item = Note>) -> Self {
        Self {
            table: Mutex::new(NoteTable::seeded(notes)),
            faults: FaultPlan::default(),
        }
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    fn table(&self) -> Result<MutexGuard<'_, NoteTable>, RepositoryError> {
        self.table.lock().map_err(|_| RepositoryError::Poisoned)
    }
}

impl NoteRepository for InMemoryNoteRepository {
    fn name(&self) -> &'static str {
        "memory"
    }

    #[instrument(skip(self))]
    fn fetch_all(&self) -> Result<Vec<Note>, RepositoryError> {
        self.faults.check(RepositoryOperation::FetchAll)?;
        Ok(self.table()?.all())
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    fn create(&self, draft: Note) -> Result<Note, RepositoryError> {
        self.faults.check(RepositoryOperation::Create)?;
        Ok(self.table()?.insert_new(draft))
    }

    #[instrument(skip(self, note), fields(id = %note.id))]
    fn update(&self, note: Note) -> Result<Note, RepositoryError> {
        self.faults.check(RepositoryOperation::Update)?;
        self.table()?.replace(note)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: NoteId) -> Result<(), RepositoryError> {
        self.faults.check(RepositoryOperation::Delete)?;
        self.table()?.remove(id)
    }
}

/// Sample notes for a fresh in-memory store.
pub fn demo_notes() -> Vec<Note> {
    vec![
        Note {
            id: NoteId::UNSAVED,
            title: "Opening keynote".to_string(),
            presenter: "Program committee".to_string(),
            rating: 8,
            body: "Good overview of the tracks. Slides will be shared.".to_string(),
        },
        Note {
            id: NoteId::UNSAVED,
            title: "Ownership in practice".to_string(),
            presenter: "Ferris".to_string(),
            rating: 6,
            body: "Borrow checker war stories, ran a bit long.".to_string(),
        },
        Note {
            id: NoteId::UNSAVED,
            title: "Lightning talks".to_string(),
            presenter: "Various".to_string(),
            rating: 4,
            body: String::new(),
        },
    ]
}
