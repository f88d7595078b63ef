use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use super::config::BehaviorConfig;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 10;

pub const FETCH_FAILED_MESSAGE: &str = "Could not load the session notes. Try again later.";

/// Identifier assigned by the note repository. `NoteId(0)` marks a note that
/// has not been persisted yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NoteId(pub u64);

impl NoteId {
    pub const UNSAVED: NoteId = NoteId(0);

    pub fn is_unsaved(self) -> bool {
        self == Self::UNSAVED
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub presenter: String,
    pub rating: u8,
    pub body: String,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            id: NoteId::UNSAVED,
            title: String::new(),
            presenter: String::new(),
            rating: RATING_MIN,
            body: String::new(),
        }
    }
}

impl Note {
    /// A fresh draft for a note that does not exist on the server yet.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_unsaved(&self) -> bool {
        self.id.is_unsaved()
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating.clamp(RATING_MIN, RATING_MAX);
        self
    }
}

/// Server-confirmed notes keyed by id. Unsaved notes never enter the map, so
/// every key is non-zero and equal to the id of the note stored under it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteCollection {
    entries: BTreeMap<NoteId, Note>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `note.id`. Returns `false` and
    /// leaves the collection untouched for unsaved notes.
    pub fn insert(&mut self, note: Note) -> bool {
        if note.is_unsaved() {
            return false;
        }
        self.entries.insert(note.id, note);
        true
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        self.entries.remove(&id)
    }

    /// Replaces the whole collection, returning how many notes were skipped
    /// because they carried the unsaved id.
    pub fn replace_all(&mut self, notes: impl IntoIterator<Item = Note>) -> usize {
        self.entries.clear();
        let mut skipped = 0;
        for note in notes {
            if !self.insert(note) {
                skipped += 1;
            }
        }
        skipped
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.entries.keys().copied()
    }

    pub fn keys_match_ids(&self) -> bool {
        self.entries
            .iter()
            .all(|(key, note)| *key == note.id && !key.is_unsaved())
    }
}

impl FromIterator<Note> for NoteCollection {
    fn from_iter<T: IntoIterator<Item = Note>>(iter: T) -> Self {
        let mut collection = Self::new();
        collection.replace_all(iter);
        collection
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Loading,
    Ready,
    Failed(Arc<str>),
}

impl RequestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditFocus {
    #[default]
    None,
    Editing(Note),
}

impl EditFocus {
    pub fn draft(&self) -> Option<&Note> {
        match self {
            Self::None => None,
            Self::Editing(draft) => Some(draft),
        }
    }

    pub fn editing_id(&self) -> Option<NoteId> {
        self.draft().map(|draft| draft.id)
    }

    pub fn is_new_draft(&self) -> bool {
        self.draft().is_some_and(Note::is_unsaved)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteConfirmation {
    #[default]
    None,
    PendingFor(NoteId),
}

impl DeleteConfirmation {
    pub fn pending_for(self) -> Option<NoteId> {
        match self {
            Self::None => None,
            Self::PendingFor(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Visible record of a failed create/update/delete. Only produced when
/// `BehaviorConfig::surface_mutation_errors` is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationNotice {
    pub kind: MutationKind,
    pub id: Option<NoteId>,
    pub message: Arc<str>,
}

impl MutationNotice {
    pub fn summary(&self) -> String {
        match self.id {
            Some(id) => format!("Could not {} note {}: {}", self.kind.label(), id, self.message),
            None => format!("Could not {} note: {}", self.kind.label(), self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Tags outgoing repository calls so responses can be ordered against each
/// other. Writes (update or delete of an existing note) are tracked per note
/// only while one is in flight; a write supersedes older ones once its
/// success has been applied.
#[derive(Debug, Clone)]
pub struct RequestLedger {
    next_request_id: u64,
    latest_fetch: Option<RequestId>,
    in_flight_writes: HashMap<NoteId, BTreeSet<RequestId>>,
    latest_applied_write: HashMap<NoteId, RequestId>,
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self {
            next_request_id: 1,
            latest_fetch: None,
            in_flight_writes: HashMap::new(),
            latest_applied_write: HashMap::new(),
        }
    }
}

impl RequestLedger {
    pub fn issue(&mut self) -> RequestId {
        let id = RequestId(self.next_request_id);
        self.next_request_id += 1;
        id
    }

    pub fn issue_fetch(&mut self) -> RequestId {
        let id = self.issue();
        self.latest_fetch = Some(id);
        id
    }

    /// Issues a request that writes to an existing note (update or delete).
    pub fn issue_write(&mut self, note: NoteId) -> RequestId {
        let id = self.issue();
        self.in_flight_writes.entry(note).or_default().insert(id);
        id
    }

    pub fn is_superseded_fetch(&self, request: RequestId) -> bool {
        self.latest_fetch.is_some_and(|latest| latest > request)
    }

    /// True when a newer write to `note` has already been applied.
    pub fn is_superseded_write(&self, note: NoteId, request: RequestId) -> bool {
        self.latest_applied_write
            .get(&note)
            .is_some_and(|latest| *latest > request)
    }

    /// Records the response to a write. `applied` is false for failures and
    /// for dropped responses. Once no write to `note` is in flight, nothing
    /// is left to order against and the note is forgotten.
    pub fn settle_write(&mut self, note: NoteId, request: RequestId, applied: bool) {
        if applied {
            let latest = self.latest_applied_write.entry(note).or_insert(request);
            *latest = (*latest).max(request);
        }
        let drained = match self.in_flight_writes.get_mut(&note) {
            Some(pending) => {
                pending.remove(&request);
                pending.is_empty()
            }
            None => true,
        };
        if drained {
            self.in_flight_writes.remove(&note);
            self.latest_applied_write.remove(&note);
        }
    }

    /// Notes the ledger currently holds write bookkeeping for.
    pub fn tracked_notes(&self) -> usize {
        let settled_only = self
            .latest_applied_write
            .keys()
            .filter(|note| !self.in_flight_writes.contains_key(note))
            .count();
        self.in_flight_writes.len() + settled_only
    }

    pub fn issued_count(&self) -> u64 {
        self.next_request_id - 1
    }
}

#[derive(Debug, Clone)]
pub struct NotesState {
    pub notes: NoteCollection,
    pub status: RequestStatus,
    pub edit: EditFocus,
    pub confirm: DeleteConfirmation,
    pub notice: Option<MutationNotice>,
    pub requests: RequestLedger,
    pub options: BehaviorConfig,
}

impl NotesState {
    /// The state before the first fetch completes. Pair it with the fetch
    /// effect from [`crate::reducer::init`] rather than constructing it alone.
    pub fn new(options: BehaviorConfig) -> Self {
        Self {
            notes: NoteCollection::new(),
            status: RequestStatus::Loading,
            edit: EditFocus::None,
            confirm: DeleteConfirmation::None,
            notice: None,
            requests: RequestLedger::default(),
            options,
        }
    }
}

impl Default for NotesState {
    fn default() -> Self {
        Self::new(BehaviorConfig::default())
    }
}
