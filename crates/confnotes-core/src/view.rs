//! Pure projection from [`NotesState`] to a render tree.
//!
//! The tree decides which state combinations are visible to the user; it does
//! not know about layout or colors. Every affordance carries the
//! [`UserEvent`] the shell should dispatch when it is activated.

use std::ops::RangeInclusive;
use std::sync::Arc;

use super::actions::UserEvent;
use super::state::DeleteConfirmation;
use super::state::EditFocus;
use super::state::Note;
use super::state::NoteId;
use super::state::NotesState;
use super::state::RequestStatus;
use super::state::RATING_MAX;
use super::state::RATING_MIN;

pub const PAGE_TITLE: &str = "Session notes";
pub const LOADING_PLACEHOLDER: &str = "Loading notes...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    High,
    Medium,
    Low,
}

impl RatingTier {
    pub fn for_rating(rating: u8) -> Self {
        if rating > 7 {
            Self::High
        } else if rating > 5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    AddNote,
    Edit,
    Delete,
    ConfirmDelete,
    KeepNote,
    Save,
    Cancel,
    Retry,
    DismissNotice,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::AddNote => "Add note",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
            Self::ConfirmDelete => "Confirm delete",
            Self::KeepNote => "Keep",
            Self::Save => "Save",
            Self::Cancel => "Cancel",
            Self::Retry => "Retry",
            Self::DismissNotice => "Dismiss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewAction {
    pub kind: ActionKind,
    pub event: UserEvent,
}

impl ViewAction {
    fn new(kind: ActionKind, event: UserEvent) -> Self {
        Self { kind, event }
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesView {
    pub header: HeaderView,
    pub notice: Option<NoticeView>,
    pub body: BodyView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub title: &'static str,
    pub add_note: Option<ViewAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub message: String,
    pub dismiss: ViewAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    Loading {
        placeholder: &'static str,
    },
    Failed {
        message: Arc<str>,
        retry: ViewAction,
    },
    Ready {
        creation_form: Option<EditFormView>,
        items: Vec<NoteItemView>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteItemView {
    Summary(SummaryView),
    Editing(EditFormView),
}

impl NoteItemView {
    pub fn id(&self) -> NoteId {
        match self {
            Self::Summary(summary) => summary.id,
            Self::Editing(form) => form.draft.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingBadge {
    pub value: u8,
    pub tier: RatingTier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub id: NoteId,
    pub title: String,
    pub presenter: String,
    pub rating: RatingBadge,
    pub body: String,
    pub confirming_delete: bool,
    pub actions: Vec<ViewAction>,
}

impl SummaryView {
    pub fn action(&self, kind: ActionKind) -> Option<&ViewAction> {
        self.actions.iter().find(|action| action.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Presenter,
    Rating,
    Body,
}

impl DraftField {
    pub const ALL: [DraftField; 4] = [Self::Title, Self::Presenter, Self::Rating, Self::Body];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Presenter => "Presenter",
            Self::Rating => "Rating",
            Self::Body => "Notes",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Title => Self::Presenter,
            Self::Presenter => Self::Rating,
            Self::Rating => Self::Body,
            Self::Body => Self::Title,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Title => Self::Body,
            Self::Presenter => Self::Title,
            Self::Rating => Self::Presenter,
            Self::Body => Self::Rating,
        }
    }

    pub fn is_multiline(self) -> bool {
        self == Self::Body
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFormView {
    pub draft: Note,
    pub rating_choices: RangeInclusive<u8>,
    /// Always enabled; empty fields are left for the server to judge.
    pub save: ViewAction,
    pub cancel: ViewAction,
}

impl EditFormView {
    fn new(draft: &Note) -> Self {
        Self {
            draft: draft.clone(),
            rating_choices: RATING_MIN..=RATING_MAX,
            save: ViewAction::new(ActionKind::Save, UserEvent::Save),
            cancel: ViewAction::new(ActionKind::Cancel, UserEvent::CancelEdit),
        }
    }

    pub fn is_new(&self) -> bool {
        self.draft.is_unsaved()
    }

    pub fn field_value(&self, field: DraftField) -> String {
        match field {
            DraftField::Title => self.draft.title.clone(),
            DraftField::Presenter => self.draft.presenter.clone(),
            DraftField::Rating => self.draft.rating.to_string(),
            DraftField::Body => self.draft.body.clone(),
        }
    }

    /// `DraftChanged` for the draft with one text field replaced. A typed
    /// rating is clamped into the picker range.
    pub fn with_text(&self, field: DraftField, value: String) -> UserEvent {
        let mut draft = self.draft.clone();
        match field {
            DraftField::Title => draft.title = value,
            DraftField::Presenter => draft.presenter = value,
            DraftField::Body => draft.body = value,
            DraftField::Rating => {
                // Non-numeric input keeps the current rating.
                if let Ok(rating) = value.trim().parse::<u64>() {
                    draft = draft.with_rating(u8::try_from(rating).unwrap_or(u8::MAX));
                }
            }
        }
        UserEvent::DraftChanged(draft)
    }

    /// `DraftChanged` with the rating moved by `delta`, kept inside the picker range.
    pub fn with_rating_step(&self, delta: i8) -> UserEvent {
        let current = self.draft.rating as i16;
        let next = (current + delta as i16)
            .clamp(*self.rating_choices.start() as i16, *self.rating_choices.end() as i16);
        let draft = self.draft.clone().with_rating(next as u8);
        UserEvent::DraftChanged(draft)
    }
}

pub fn render(state: &NotesState) -> NotesView {
    let add_note = (!state.edit.is_new_draft())
        .then(|| ViewAction::new(ActionKind::AddNote, UserEvent::StartNewNote));

    let notice = state.notice.as_ref().map(|notice| NoticeView {
        message: notice.summary(),
        dismiss: ViewAction::new(ActionKind::DismissNotice, UserEvent::DismissNotice),
    });

    let body = match &state.status {
        RequestStatus::Loading => BodyView::Loading {
            placeholder: LOADING_PLACEHOLDER,
        },
        RequestStatus::Failed(message) => BodyView::Failed {
            message: Arc::clone(message),
            retry: ViewAction::new(ActionKind::Retry, UserEvent::ReloadNotes),
        },
        RequestStatus::Ready => render_ready(state),
    };

    NotesView {
        header: HeaderView {
            title: PAGE_TITLE,
            add_note,
        },
        notice,
        body,
    }
}

fn render_ready(state: &NotesState) -> BodyView {
    let creation_form = match &state.edit {
        EditFocus::Editing(draft) if draft.is_unsaved() => Some(EditFormView::new(draft)),
        _ => None,
    };

    let items = state
        .notes
        .iter()
        .map(|note| match &state.edit {
            EditFocus::Editing(draft) if draft.id == note.id => {
                NoteItemView::Editing(EditFormView::new(draft))
            }
            _ => NoteItemView::Summary(render_summary(note, state.confirm)),
        })
        .collect();

    BodyView::Ready {
        creation_form,
        items,
    }
}

fn render_summary(note: &Note, confirm: DeleteConfirmation) -> SummaryView {
    let confirming_delete = confirm.pending_for() == Some(note.id);
    let actions = if confirming_delete {
        vec![
            ViewAction::new(ActionKind::ConfirmDelete, UserEvent::ConfirmedDelete(note.id)),
            ViewAction::new(ActionKind::KeepNote, UserEvent::CancelDelete),
        ]
    } else {
        vec![
            ViewAction::new(ActionKind::Edit, UserEvent::StartEdit(note.clone())),
            ViewAction::new(ActionKind::Delete, UserEvent::RequestDeleteConfirm(note.id)),
        ]
    };

    SummaryView {
        id: note.id,
        title: note.title.clone(),
        presenter: note.presenter.clone(),
        rating: RatingBadge {
            value: note.rating,
            tier: RatingTier::for_rating(note.rating),
        },
        body: note.body.clone(),
        confirming_delete,
        actions,
    }
}
