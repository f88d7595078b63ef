use pretty_assertions::assert_eq;

pub(super) use super::init;
pub(super) use super::reduce;
pub(super) use crate::actions::NotesEffect;
pub(super) use crate::actions::NotesEvent;
pub(super) use crate::actions::RepositoryEvent;
pub(super) use crate::actions::RepositoryFailure;
pub(super) use crate::actions::UserEvent;
pub(super) use crate::config::BehaviorConfig;
pub(super) use crate::config::StaleResponsePolicy;
pub(super) use crate::state::DeleteConfirmation;
pub(super) use crate::state::EditFocus;
pub(super) use crate::state::MutationKind;
pub(super) use crate::state::Note;
pub(super) use crate::state::NoteId;
pub(super) use crate::state::NotesState;
pub(super) use crate::state::RequestId;
pub(super) use crate::state::RequestStatus;

mod scenarios;
mod stale_responses;

/// Ready state holding `notes`, as if the initial fetch had completed.
fn ready_state(notes: Vec<Note>) -> NotesState {
    ready_state_with(BehaviorConfig::default(), notes)
}

fn ready_state_with(options: BehaviorConfig, notes: Vec<Note>) -> NotesState {
    let (mut state, effect) = init(options);
    let NotesEffect::FetchAll { request } = effect else {
        panic!("init must request a fetch, got {effect:?}");
    };
    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request,
            result: Ok(notes),
        },
    );
    assert_eq!(state.status, RequestStatus::Ready);
    state
}

fn note(id: u64, title: &str) -> Note {
    Note {
        id: NoteId(id),
        title: title.to_string(),
        presenter: "Grace Hopper".to_string(),
        rating: 7,
        body: format!("notes on {title}"),
    }
}

fn user(state: &mut NotesState, event: UserEvent) -> Option<NotesEffect> {
    reduce(state, NotesEvent::User(event))
}

fn respond(state: &mut NotesState, event: RepositoryEvent) {
    let effect = reduce(state, NotesEvent::Repository(event));
    assert!(effect.is_none());
}

fn failure(message: &str) -> RepositoryFailure {
    RepositoryFailure::new(message)
}

fn saved(request: RequestId, target: NoteId, note: Note) -> RepositoryEvent {
    RepositoryEvent::NoteSaved {
        request,
        target,
        result: Ok(note),
    }
}

fn deleted(request: RequestId, id: NoteId) -> RepositoryEvent {
    RepositoryEvent::NoteDeleted {
        request,
        id,
        result: Ok(()),
    }
}

fn note_ids(state: &NotesState) -> Vec<u64> {
    state.notes.ids().map(|id| id.0).collect()
}
