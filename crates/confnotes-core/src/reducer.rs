use std::mem;

use tracing::debug;
use tracing::warn;

use super::actions::NotesEffect;
use super::actions::NotesEvent;
use super::actions::RepositoryEvent;
use super::actions::RepositoryFailure;
use super::actions::UserEvent;
use super::config::BehaviorConfig;
use super::config::StaleResponsePolicy;
use super::state::DeleteConfirmation;
use super::state::EditFocus;
use super::state::MutationKind;
use super::state::MutationNotice;
use super::state::Note;
use super::state::NoteId;
use super::state::NotesState;
use super::state::RequestStatus;
use super::state::FETCH_FAILED_MESSAGE;

/// Initial state paired with the fetch that populates it.
pub fn init(options: BehaviorConfig) -> (NotesState, NotesEffect) {
    let mut state = NotesState::new(options);
    let request = state.requests.issue_fetch();
    (state, NotesEffect::FetchAll { request })
}

pub fn reduce(state: &mut NotesState, event: NotesEvent) -> Option<NotesEffect> {
    match event {
        NotesEvent::User(user) => reduce_user(state, user),
        NotesEvent::Repository(response) => {
            reduce_repository(state, response);
            None
        }
    }
}

fn reduce_user(state: &mut NotesState, event: UserEvent) -> Option<NotesEffect> {
    match event {
        UserEvent::StartNewNote => {
            state.edit = EditFocus::Editing(Note::blank());
            None
        }
        UserEvent::StartEdit(note) => {
            state.edit = EditFocus::Editing(note);
            None
        }
        UserEvent::DraftChanged(note) => {
            match &mut state.edit {
                EditFocus::Editing(draft) if draft.id == note.id => *draft = note,
                EditFocus::Editing(draft) => {
                    debug!(
                        draft = %draft.id,
                        changed = %note.id,
                        "ignoring draft change for a different note"
                    );
                }
                EditFocus::None => debug!(changed = %note.id, "ignoring draft change with no open draft"),
            }
            None
        }
        UserEvent::CancelEdit => {
            state.edit = EditFocus::None;
            None
        }
        UserEvent::Save => {
            let EditFocus::Editing(draft) = mem::take(&mut state.edit) else {
                return None;
            };
            if draft.is_unsaved() {
                let request = state.requests.issue();
                Some(NotesEffect::Create { request, draft })
            } else {
                let request = state.requests.issue_write(draft.id);
                Some(NotesEffect::Update {
                    request,
                    note: draft,
                })
            }
        }
        UserEvent::RequestDeleteConfirm(id) => {
            state.confirm = DeleteConfirmation::PendingFor(id);
            None
        }
        UserEvent::CancelDelete => {
            state.confirm = DeleteConfirmation::None;
            None
        }
        UserEvent::ConfirmedDelete(id) => {
            clear_confirmation_for(state, id);
            let request = state.requests.issue_write(id);
            Some(NotesEffect::Delete { request, id })
        }
        UserEvent::ReloadNotes => {
            state.status = RequestStatus::Loading;
            let request = state.requests.issue_fetch();
            Some(NotesEffect::FetchAll { request })
        }
        UserEvent::DismissNotice => {
            state.notice = None;
            None
        }
    }
}

fn reduce_repository(state: &mut NotesState, event: RepositoryEvent) {
    let drop_superseded = state.options.stale_responses == StaleResponsePolicy::DropSuperseded;

    match event {
        RepositoryEvent::NotesFetched { request, result } => {
            if drop_superseded && state.requests.is_superseded_fetch(request) {
                debug!(%request, "dropping superseded fetch response");
                return;
            }
            match result {
                Ok(notes) => {
                    let skipped = state.notes.replace_all(notes);
                    if skipped > 0 {
                        warn!(skipped, "fetched notes without a server id were ignored");
                    }
                    state.status = RequestStatus::Ready;
                }
                Err(failure) => {
                    warn!(%request, error = %failure, "fetching notes failed");
                    state.status = RequestStatus::Failed(FETCH_FAILED_MESSAGE.into());
                }
            }
        }
        RepositoryEvent::NoteSaved {
            request,
            target,
            result,
        } => {
            let kind = if target.is_unsaved() {
                MutationKind::Create
            } else {
                MutationKind::Update
            };
            if kind == MutationKind::Update {
                if drop_superseded && state.requests.is_superseded_write(target, request) {
                    debug!(%request, note = %target, "dropping superseded update response");
                    state.requests.settle_write(target, request, false);
                    return;
                }
                state.requests.settle_write(target, request, result.is_ok());
            }
            match result {
                Ok(note) => {
                    let id = note.id;
                    if state.notes.insert(note) {
                        state.notice = None;
                    } else {
                        warn!(%request, "saved note came back without a server id");
                    }
                    debug!(%request, note = %id, kind = kind.label(), "note saved");
                }
                Err(failure) => {
                    let id = (kind == MutationKind::Update).then_some(target);
                    record_mutation_failure(state, kind, id, failure);
                }
            }
        }
        RepositoryEvent::NoteDeleted {
            request,
            id,
            result,
        } => {
            state.requests.settle_write(id, request, result.is_ok());
            match result {
                Ok(()) => {
                    state.notes.remove(id);
                    clear_confirmation_for(state, id);
                    state.notice = None;
                    debug!(%request, note = %id, "note deleted");
                }
                Err(failure) => {
                    record_mutation_failure(state, MutationKind::Delete, Some(id), failure)
                }
            }
        }
    }
}

fn clear_confirmation_for(state: &mut NotesState, id: NoteId) {
    if state.confirm == DeleteConfirmation::PendingFor(id) {
        state.confirm = DeleteConfirmation::None;
    }
}

fn record_mutation_failure(
    state: &mut NotesState,
    kind: MutationKind,
    id: Option<NoteId>,
    failure: RepositoryFailure,
) {
    warn!(kind = kind.label(), error = %failure, "note mutation failed");
    if state.options.surface_mutation_errors {
        state.notice = Some(MutationNotice {
            kind,
            id,
            message: failure.message,
        });
    }
}

#[cfg(test)]
mod tests;
