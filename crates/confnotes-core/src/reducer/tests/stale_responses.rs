use super::*;
use pretty_assertions::assert_eq;

fn dropping() -> BehaviorConfig {
    BehaviorConfig {
        stale_responses: StaleResponsePolicy::DropSuperseded,
        ..BehaviorConfig::default()
    }
}

/// Issues an update for `edited`, then a delete for the same note.
fn update_then_delete(state: &mut NotesState, edited: &Note) -> (RequestId, RequestId) {
    user(state, UserEvent::StartEdit(edited.clone()));
    let update = user(state, UserEvent::Save).expect("update");
    let delete = user(state, UserEvent::ConfirmedDelete(edited.id)).expect("delete");
    (update.request(), delete.request())
}

#[test]
fn default_policy_applies_update_that_lands_after_delete() {
    let original = note(8, "eight");
    let mut state = ready_state(vec![original.clone()]);
    let (update, delete) = update_then_delete(&mut state, &original);

    respond(&mut state, deleted(delete, NoteId(8)));
    respond(&mut state, saved(update, NoteId(8), original.clone()));

    assert_eq!(note_ids(&state), vec![8]);
}

#[test]
fn drop_superseded_ignores_update_that_lands_after_delete() {
    let original = note(8, "eight");
    let mut state = ready_state_with(dropping(), vec![original.clone()]);
    let (update, delete) = update_then_delete(&mut state, &original);

    respond(&mut state, deleted(delete, NoteId(8)));
    respond(&mut state, saved(update, NoteId(8), original));

    assert!(state.notes.is_empty());
}

#[test]
fn drop_superseded_keeps_latest_of_two_updates() {
    let original = note(1, "v0");
    let mut state = ready_state_with(dropping(), vec![original.clone()]);

    let mut first = original.clone();
    first.title = "v1".to_string();
    user(&mut state, UserEvent::StartEdit(first.clone()));
    let first_request = user(&mut state, UserEvent::Save).expect("first").request();

    let mut second = original.clone();
    second.title = "v2".to_string();
    user(&mut state, UserEvent::StartEdit(second.clone()));
    let second_request = user(&mut state, UserEvent::Save).expect("second").request();

    respond(&mut state, saved(second_request, NoteId(1), second.clone()));
    respond(&mut state, saved(first_request, NoteId(1), first));

    assert_eq!(state.notes.get(NoteId(1)), Some(&second));
}

#[test]
fn default_policy_applies_updates_in_arrival_order() {
    let original = note(1, "v0");
    let mut state = ready_state(vec![original.clone()]);

    let mut first = original.clone();
    first.title = "v1".to_string();
    user(&mut state, UserEvent::StartEdit(first.clone()));
    let first_request = user(&mut state, UserEvent::Save).expect("first").request();

    let mut second = original.clone();
    second.title = "v2".to_string();
    user(&mut state, UserEvent::StartEdit(second.clone()));
    let second_request = user(&mut state, UserEvent::Save).expect("second").request();

    respond(&mut state, saved(second_request, NoteId(1), second));
    respond(&mut state, saved(first_request, NoteId(1), first.clone()));

    assert_eq!(state.notes.get(NoteId(1)), Some(&first));
}

#[test]
fn drop_superseded_ignores_older_fetch() {
    let (mut state, initial) = init(dropping());
    let reload = user(&mut state, UserEvent::ReloadNotes).expect("reload");

    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: reload.request(),
            result: Ok(vec![note(2, "fresh")]),
        },
    );
    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: initial.request(),
            result: Ok(vec![note(1, "stale")]),
        },
    );

    assert_eq!(note_ids(&state), vec![2]);
    assert_eq!(state.status, RequestStatus::Ready);
}

#[test]
fn drop_superseded_still_applies_creates() {
    let mut state = ready_state_with(dropping(), Vec::new());
    user(&mut state, UserEvent::StartNewNote);
    let create = user(&mut state, UserEvent::Save).expect("create");
    user(&mut state, UserEvent::StartNewNote);
    let _later = user(&mut state, UserEvent::Save).expect("create");

    respond(&mut state, saved(create.request(), NoteId::UNSAVED, note(11, "first")));
    assert_eq!(note_ids(&state), vec![11]);
}

#[test]
fn drop_superseded_applies_update_when_later_update_fails() {
    let original = note(1, "v0");
    let mut state = ready_state_with(dropping(), vec![original.clone()]);

    let mut first = original.clone();
    first.title = "v1".to_string();
    user(&mut state, UserEvent::StartEdit(first.clone()));
    let first_request = user(&mut state, UserEvent::Save).expect("first").request();

    let mut second = original.clone();
    second.title = "v2".to_string();
    user(&mut state, UserEvent::StartEdit(second));
    let second_request = user(&mut state, UserEvent::Save).expect("second").request();

    respond(
        &mut state,
        RepositoryEvent::NoteSaved {
            request: second_request,
            target: NoteId(1),
            result: Err(failure("conflict")),
        },
    );
    respond(&mut state, saved(first_request, NoteId(1), first.clone()));

    assert_eq!(state.notes.get(NoteId(1)), Some(&first));
}

#[test]
fn drop_superseded_applies_update_when_later_delete_fails() {
    let original = note(8, "eight");
    let mut state = ready_state_with(dropping(), vec![original.clone()]);
    let mut edited = original.clone();
    edited.title = "edited".to_string();
    let (update, delete) = update_then_delete(&mut state, &edited);

    respond(
        &mut state,
        RepositoryEvent::NoteDeleted {
            request: delete,
            id: NoteId(8),
            result: Err(failure("read-only")),
        },
    );
    respond(&mut state, saved(update, NoteId(8), edited.clone()));

    assert_eq!(state.notes.get(NoteId(8)), Some(&edited));
}

#[test]
fn ledger_forgets_notes_once_their_writes_are_answered() {
    let original = note(8, "eight");
    let mut state = ready_state_with(dropping(), vec![original.clone(), note(9, "nine")]);
    let (update, delete) = update_then_delete(&mut state, &original);
    let other = user(&mut state, UserEvent::ConfirmedDelete(NoteId(9))).expect("delete");
    assert_eq!(state.requests.tracked_notes(), 2);

    respond(&mut state, deleted(delete, NoteId(8)));
    respond(&mut state, deleted(other.request(), NoteId(9)));
    assert_eq!(state.requests.tracked_notes(), 1);

    respond(&mut state, saved(update, NoteId(8), original));
    assert_eq!(state.requests.tracked_notes(), 0);
    assert!(state.notes.is_empty());
}

/// Fetches are only ordered against other fetches, so a snapshot taken before
/// a create still replaces the collection when it lands after the create.
#[test]
fn drop_superseded_applies_fetch_that_predates_a_create() {
    let mut state = ready_state_with(dropping(), Vec::new());
    let reload = user(&mut state, UserEvent::ReloadNotes).expect("reload");
    user(&mut state, UserEvent::StartNewNote);
    let create = user(&mut state, UserEvent::Save).expect("create");

    respond(&mut state, saved(create.request(), NoteId::UNSAVED, note(11, "new")));
    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: reload.request(),
            result: Ok(Vec::new()),
        },
    );

    assert!(state.notes.is_empty());
    assert_eq!(state.status, RequestStatus::Ready);
}
