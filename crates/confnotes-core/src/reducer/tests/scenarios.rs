use super::*;
use pretty_assertions::assert_eq;

#[test]
fn init_starts_loading_and_requests_fetch() {
    let (state, effect) = init(BehaviorConfig::default());
    assert_eq!(state.status, RequestStatus::Loading);
    assert!(state.notes.is_empty());
    assert_eq!(state.edit, EditFocus::None);
    assert_eq!(state.confirm, DeleteConfirmation::None);
    assert_eq!(effect, NotesEffect::FetchAll { request: RequestId(1) });
}

#[test]
fn fetched_notes_are_indexed_by_id() {
    let state = ready_state(vec![note(9, "nine"), note(2, "two")]);
    assert_eq!(note_ids(&state), vec![2, 9]);
    assert_eq!(state.notes.get(NoteId(9)).map(|n| n.title.as_str()), Some("nine"));
}

#[test]
fn create_flow_inserts_server_assigned_note() {
    let mut state = ready_state(Vec::new());

    assert_eq!(user(&mut state, UserEvent::StartNewNote), None);
    assert_eq!(state.edit, EditFocus::Editing(Note::blank()));

    let mut draft = Note::blank();
    draft.title = "Intro to X".to_string();
    assert_eq!(user(&mut state, UserEvent::DraftChanged(draft.clone())), None);

    let effect = user(&mut state, UserEvent::Save);
    let Some(NotesEffect::Create { request, draft: sent }) = effect else {
        panic!("expected create effect, got {effect:?}");
    };
    assert_eq!(sent, draft);
    assert_eq!(sent.id, NoteId(0));
    assert_eq!(sent.rating, 1);
    assert_eq!(state.edit, EditFocus::None);

    let mut stored = draft;
    stored.id = NoteId(7);
    respond(&mut state, saved(request, NoteId::UNSAVED, stored.clone()));

    assert_eq!(note_ids(&state), vec![7]);
    assert_eq!(state.notes.get(NoteId(7)), Some(&stored));
}

#[test]
fn update_flow_overwrites_existing_entry_only_after_success() {
    let original = note(3, "Rust at scale");
    let mut state = ready_state(vec![original.clone()]);

    user(&mut state, UserEvent::StartEdit(original.clone()));
    let mut draft = original.clone();
    draft.rating = 10;
    user(&mut state, UserEvent::DraftChanged(draft.clone()));
    assert_eq!(state.notes.get(NoteId(3)), Some(&original));

    let effect = user(&mut state, UserEvent::Save);
    let Some(NotesEffect::Update { request, note: sent }) = effect else {
        panic!("expected update effect, got {effect:?}");
    };
    assert_eq!(sent, draft);
    assert_eq!(state.notes.get(NoteId(3)), Some(&original));

    respond(&mut state, saved(request, NoteId(3), draft.clone()));
    assert_eq!(state.notes.get(NoteId(3)), Some(&draft));
}

#[test]
fn delete_flow_removes_note_after_confirmation_from_server() {
    let note_a = note(7, "A");
    let mut state = ready_state(vec![note_a.clone()]);

    let effect = user(&mut state, UserEvent::ConfirmedDelete(NoteId(7)));
    let Some(NotesEffect::Delete { request, id }) = effect else {
        panic!("expected delete effect, got {effect:?}");
    };
    assert_eq!(id, NoteId(7));
    assert_eq!(state.notes.get(NoteId(7)), Some(&note_a));

    respond(&mut state, deleted(request, NoteId(7)));
    assert!(state.notes.is_empty());
}

#[test]
fn fetch_failure_sets_failed_status_and_keeps_notes_empty() {
    let (mut state, effect) = init(BehaviorConfig::default());
    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: effect.request(),
            result: Err(failure("connection refused")),
        },
    );
    assert!(matches!(state.status, RequestStatus::Failed(_)));
    assert!(state.notes.is_empty());
}

#[test]
fn fetch_failure_message_is_generic() {
    let (mut state, effect) = init(BehaviorConfig::default());
    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: effect.request(),
            result: Err(failure("SELECT failed: secret table")),
        },
    );
    let RequestStatus::Failed(message) = &state.status else {
        panic!("expected failed status");
    };
    assert!(!message.contains("secret"));
}

#[test]
fn save_failure_is_silent_by_default() {
    let existing = note(4, "Keynote");
    let mut state = ready_state(vec![existing.clone()]);
    user(&mut state, UserEvent::StartEdit(existing.clone()));
    let effect = user(&mut state, UserEvent::Save).expect("update effect");

    respond(
        &mut state,
        RepositoryEvent::NoteSaved {
            request: effect.request(),
            target: NoteId(4),
            result: Err(failure("500")),
        },
    );

    assert_eq!(state.notes.get(NoteId(4)), Some(&existing));
    assert_eq!(state.edit, EditFocus::None);
    assert_eq!(state.notice, None);
    assert_eq!(state.status, RequestStatus::Ready);
}

#[test]
fn delete_failure_keeps_note() {
    let mut state = ready_state(vec![note(1, "one")]);
    let effect = user(&mut state, UserEvent::ConfirmedDelete(NoteId(1))).expect("delete effect");
    respond(
        &mut state,
        RepositoryEvent::NoteDeleted {
            request: effect.request(),
            id: NoteId(1),
            result: Err(failure("forbidden")),
        },
    );
    assert_eq!(note_ids(&state), vec![1]);
    assert_eq!(state.notice, None);
}

#[test]
fn reload_after_failure_returns_to_loading_and_fetches_again() {
    let (mut state, effect) = init(BehaviorConfig::default());
    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: effect.request(),
            result: Err(failure("offline")),
        },
    );

    let reload = user(&mut state, UserEvent::ReloadNotes);
    assert_eq!(reload, Some(NotesEffect::FetchAll { request: RequestId(2) }));
    assert_eq!(state.status, RequestStatus::Loading);

    respond(
        &mut state,
        RepositoryEvent::NotesFetched {
            request: RequestId(2),
            result: Ok(vec![note(1, "back online")]),
        },
    );
    assert_eq!(state.status, RequestStatus::Ready);
    assert_eq!(note_ids(&state), vec![1]);
}

#[test]
fn mutation_failures_never_touch_request_status() {
    let (mut state, _) = init(BehaviorConfig::default());
    respond(
        &mut state,
        RepositoryEvent::NoteSaved {
            request: RequestId(5),
            target: NoteId::UNSAVED,
            result: Err(failure("boom")),
        },
    );
    assert_eq!(state.status, RequestStatus::Loading);
}
