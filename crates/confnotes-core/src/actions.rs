use std::fmt;
use std::sync::Arc;

use super::state::Note;
use super::state::NoteId;
use super::state::RequestId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesEvent {
    User(UserEvent),
    Repository(RepositoryEvent),
}

impl From<UserEvent> for NotesEvent {
    fn from(event: UserEvent) -> Self {
        Self::User(event)
    }
}

impl From<RepositoryEvent> for NotesEvent {
    fn from(event: RepositoryEvent) -> Self {
        Self::Repository(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    StartNewNote,
    StartEdit(Note),
    /// The whole draft after a form edit; ignored unless its id matches the
    /// open draft.
    DraftChanged(Note),
    CancelEdit,
    Save,
    RequestDeleteConfirm(NoteId),
    CancelDelete,
    ConfirmedDelete(NoteId),
    ReloadNotes,
    DismissNotice,
}

impl UserEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartNewNote => "start-new-note",
            Self::StartEdit(_) => "start-edit",
            Self::DraftChanged(_) => "draft-changed",
            Self::CancelEdit => "cancel-edit",
            Self::Save => "save",
            Self::RequestDeleteConfirm(_) => "request-delete-confirm",
            Self::CancelDelete => "cancel-delete",
            Self::ConfirmedDelete(_) => "confirmed-delete",
            Self::ReloadNotes => "reload-notes",
            Self::DismissNotice => "dismiss-notice",
        }
    }
}

/// Opaque failure reported by the note repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFailure {
    pub message: Arc<str>,
}

impl RepositoryFailure {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RepositoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEvent {
    NotesFetched {
        request: RequestId,
        result: Result<Vec<Note>, RepositoryFailure>,
    },
    /// Response to a create (`target` is the unsaved id) or an update.
    NoteSaved {
        request: RequestId,
        target: NoteId,
        result: Result<Note, RepositoryFailure>,
    },
    NoteDeleted {
        request: RequestId,
        id: NoteId,
        result: Result<(), RepositoryFailure>,
    },
}

impl RepositoryEvent {
    pub fn request(&self) -> RequestId {
        match self {
            Self::NotesFetched { request, .. }
            | Self::NoteSaved { request, .. }
            | Self::NoteDeleted { request, .. } => *request,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Self::NotesFetched { result, .. } => result.is_ok(),
            Self::NoteSaved { result, .. } => result.is_ok(),
            Self::NoteDeleted { result, .. } => result.is_ok(),
        }
    }
}

/// A repository call requested by the reducer. The shell executes it and
/// feeds the outcome back as a [`RepositoryEvent`] carrying the same request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesEffect {
    FetchAll { request: RequestId },
    Create { request: RequestId, draft: Note },
    Update { request: RequestId, note: Note },
    Delete { request: RequestId, id: NoteId },
}

impl NotesEffect {
    pub fn request(&self) -> RequestId {
        match self {
            Self::FetchAll { request }
            | Self::Create { request, .. }
            | Self::Update { request, .. }
            | Self::Delete { request, .. } => *request,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchAll { .. } => "fetch-all",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}
