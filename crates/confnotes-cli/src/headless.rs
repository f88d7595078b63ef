//! One-shot commands. Each runs the same reducer as the terminal UI, executing
//! effects synchronously until the state settles.

use std::io::Write;

use confnotes_core::reduce;
use confnotes_core::render;
use confnotes_core::BehaviorConfig;
use confnotes_core::BodyView;
use confnotes_core::Note;
use confnotes_core::NoteId;
use confnotes_core::NoteItemView;
use confnotes_core::NotesState;
use confnotes_core::NotesView;
use confnotes_core::RequestStatus;
use confnotes_core::UserEvent;
use confnotes_exec::drive;
use confnotes_exec::EffectExecutor;
use serde::Serialize;
use tracing::info;

use crate::CliError;

/// Field values given on the command line; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub title: Option<String>,
    pub presenter: Option<String>,
    pub rating: Option<u8>,
    pub body: Option<String>,
}

impl NoteFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.presenter.is_none() && self.rating.is_none() && self.body.is_none()
    }

    fn apply_to(&self, mut note: Note) -> Note {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(presenter) = &self.presenter {
            note.presenter = presenter.clone();
        }
        if let Some(body) = &self.body {
            note.body = body.clone();
        }
        match self.rating {
            Some(rating) => note.with_rating(rating),
            None => note,
        }
    }
}

struct Session {
    state: NotesState,
    executor: EffectExecutor,
}

impl Session {
    /// Loads the notes; a failed load ends the command.
    fn open(options: BehaviorConfig, executor: EffectExecutor) -> Result<Self, CliError> {
        let options = BehaviorConfig {
            surface_mutation_errors: true,
            ..options
        };
        let (mut state, initial) = confnotes_core::init(options);
        drive(&mut state, Some(initial), &executor);
        if let RequestStatus::Failed(message) = &state.status {
            return Err(CliError::Load(message.to_string()));
        }
        Ok(Self { state, executor })
    }

    fn send(&mut self, event: UserEvent) {
        let effect = reduce(&mut self.state, event.into());
        drive(&mut self.state, effect, &self.executor);
    }

    fn note(&self, id: NoteId) -> Result<Note, CliError> {
        self.state
            .notes
            .get(id)
            .cloned()
            .ok_or(CliError::UnknownNote(id))
    }

    fn take_failure(&mut self) -> Result<(), CliError> {
        match self.state.notice.take() {
            Some(notice) => Err(CliError::Mutation(notice.summary())),
            None => Ok(()),
        }
    }
}

#[derive(Serialize)]
struct ListReport<'a> {
    count: usize,
    notes: Vec<&'a Note>,
}

pub fn list(
    options: BehaviorConfig,
    executor: EffectExecutor,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let session = Session::open(options, executor)?;
    if json {
        let report = ListReport {
            count: session.state.notes.len(),
            notes: session.state.notes.iter().collect(),
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", format_view(&render(&session.state)))?;
    }
    Ok(())
}

pub fn add(
    options: BehaviorConfig,
    executor: EffectExecutor,
    fields: &NoteFields,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut session = Session::open(options, executor)?;
    let before: Vec<NoteId> = session.state.notes.ids().collect();

    session.send(UserEvent::StartNewNote);
    session.send(UserEvent::DraftChanged(fields.apply_to(Note::blank())));
    session.send(UserEvent::Save);
    session.take_failure()?;

    let created = session
        .state
        .notes
        .iter()
        .find(|note| !before.contains(&note.id));
    match created {
        Some(note) => {
            info!(note = %note.id, "note created");
            writeln!(out, "created note {}", note.id)?;
            write!(out, "{}", format_note(note))?;
        }
        None => writeln!(out, "created note")?,
    }
    Ok(())
}

pub fn edit(
    options: BehaviorConfig,
    executor: EffectExecutor,
    id: NoteId,
    fields: &NoteFields,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut session = Session::open(options, executor)?;
    let original = session.note(id)?;

    session.send(UserEvent::StartEdit(original.clone()));
    session.send(UserEvent::DraftChanged(fields.apply_to(original)));
    session.send(UserEvent::Save);
    session.take_failure()?;

    let updated = session.note(id)?;
    writeln!(out, "updated note {id}")?;
    write!(out, "{}", format_note(&updated))?;
    Ok(())
}

pub fn delete(
    options: BehaviorConfig,
    executor: EffectExecutor,
    id: NoteId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut session = Session::open(options, executor)?;
    session.note(id)?;

    session.send(UserEvent::RequestDeleteConfirm(id));
    session.send(UserEvent::ConfirmedDelete(id));
    session.take_failure()?;

    writeln!(out, "deleted note {id}")?;
    Ok(())
}

fn format_note(note: &Note) -> String {
    let mut text = format!(
        "[{}] {} ({}) rating {}\n",
        note.id,
        note.title,
        if note.presenter.is_empty() {
            "unknown presenter"
        } else {
            &note.presenter
        },
        note.rating
    );
    for line in note.body.lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Plain-text rendering of the view tree.
pub fn format_view(view: &NotesView) -> String {
    let mut text = format!("{}\n", view.header.title);
    if let Some(notice) = &view.notice {
        text.push_str(&format!("! {}\n", notice.message));
    }
    match &view.body {
        BodyView::Loading { placeholder } => text.push_str(&format!("{placeholder}\n")),
        BodyView::Failed { message, .. } => text.push_str(&format!("{message}\n")),
        BodyView::Ready { items, .. } if items.is_empty() => text.push_str("(no notes yet)\n"),
        BodyView::Ready { items, .. } => {
            for item in items {
                match item {
                    NoteItemView::Summary(summary) => {
                        text.push_str(&format!(
                            "[{}] {} ({}) rating {} [{}]\n",
                            summary.id,
                            summary.title,
                            summary.presenter,
                            summary.rating.value,
                            summary.rating.tier.label()
                        ));
                        for line in summary.body.lines() {
                            text.push_str(&format!("    {line}\n"));
                        }
                    }
                    NoteItemView::Editing(form) => {
                        text.push_str(&format!("[{}] (editing) {}\n", form.draft.id, form.draft.title));
                    }
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confnotes_exec::demo_notes;
    use confnotes_exec::InMemoryNoteRepository;
    use confnotes_exec::JsonFileNoteRepository;
    use confnotes_exec::NoteRepository;
    use confnotes_exec::RepositoryOperation;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn output(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("utf8")
    }

    fn seeded() -> Arc<InMemoryNoteRepository> {
        Arc::new(InMemoryNoteRepository::seeded(demo_notes()))
    }

    #[test]
    fn list_prints_every_note_with_its_tier() {
        let mut out = Vec::new();
        list(
            BehaviorConfig::default(),
            EffectExecutor::new(seeded()),
            false,
            &mut out,
        )
        .expect("list");
        assert_eq!(
            output(out),
            "Session notes\n\
             [1] Opening keynote (Program committee) rating 8 [high]\n    \
             Good overview of the tracks. Slides will be shared.\n\
             [2] Ownership in practice (Ferris) rating 6 [medium]\n    \
             Borrow checker war stories, ran a bit long.\n\
             [3] Lightning talks (Various) rating 4 [low]\n"
        );
    }

    #[test]
    fn list_json_reports_count() {
        let mut out = Vec::new();
        list(
            BehaviorConfig::default(),
            EffectExecutor::new(seeded()),
            true,
            &mut out,
        )
        .expect("list");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["count"], 3);
        assert_eq!(value["notes"][2]["title"], "Lightning talks");
    }

    #[test]
    fn add_then_edit_then_delete_against_file_store() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("notes.json");
        let open = || {
            let repo = JsonFileNoteRepository::open(&path, Vec::new()).expect("open");
            EffectExecutor::new(Arc::new(repo))
        };

        let mut out = Vec::new();
        let fields = NoteFields {
            title: Some("Closing panel".to_string()),
            presenter: Some("Ada".to_string()),
            rating: Some(9),
            body: None,
        };
        add(BehaviorConfig::default(), open(), &fields, &mut out).expect("add");
        assert_eq!(
            output(out),
            "created note 1\n[1] Closing panel (Ada) rating 9\n"
        );

        let mut out = Vec::new();
        let fields = NoteFields {
            rating: Some(3),
            ..NoteFields::default()
        };
        edit(BehaviorConfig::default(), open(), NoteId(1), &fields, &mut out).expect("edit");
        assert_eq!(
            output(out),
            "updated note 1\n[1] Closing panel (Ada) rating 3\n"
        );

        let mut out = Vec::new();
        delete(BehaviorConfig::default(), open(), NoteId(1), &mut out).expect("delete");
        assert_eq!(output(out), "deleted note 1\n");

        let repo = JsonFileNoteRepository::open(&path, Vec::new()).expect("open");
        assert!(repo.fetch_all().expect("fetch").is_empty());
    }

    #[test]
    fn edit_of_unknown_note_fails_before_any_write() {
        let err = edit(
            BehaviorConfig::default(),
            EffectExecutor::new(seeded()),
            NoteId(42),
            &NoteFields::default(),
            &mut Vec::new(),
        )
        .expect_err("unknown note");
        assert!(matches!(err, CliError::UnknownNote(NoteId(42))));
    }

    #[test]
    fn repository_failure_is_reported_as_mutation_error() {
        let repo = seeded();
        repo.faults()
            .fail_next(RepositoryOperation::Delete, "store is read-only");
        let err = delete(
            BehaviorConfig::default(),
            EffectExecutor::new(repo),
            NoteId(2),
            &mut Vec::new(),
        )
        .expect_err("injected");
        assert_eq!(
            err.to_string(),
            "Could not delete note 2: delete failed: store is read-only"
        );
    }

    #[test]
    fn failed_load_stops_the_command() {
        let repo = seeded();
        repo.faults()
            .fail_next(RepositoryOperation::FetchAll, "offline");
        let err = list(
            BehaviorConfig::default(),
            EffectExecutor::new(repo),
            false,
            &mut Vec::new(),
        )
        .expect_err("load failure");
        assert!(matches!(err, CliError::Load(_)));
    }
}
