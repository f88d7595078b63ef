use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use confnotes_core::Note;
use confnotes_core::NoteId;
use tracing::debug;
use tracing::instrument;

use crate::contracts::NoteStoreDocument;
use crate::contracts::NoteTable;
use crate::contracts::RepositoryOperation;
use crate::contracts::STORE_DOCUMENT_VERSION;
use crate::error::RepositoryError;
use crate::repository::FaultPlan;
use crate::repository::NoteRepository;

/// Note store persisted as one JSON document. Calls through one handle are
/// serialised by its mutex. Every call reloads the file, so writes made by
/// other handles show up on the next call, but nothing coordinates separate
/// handles or processes: two of them writing at once can lose an update.
#[derive(Debug)]
pub struct JsonFileNoteRepository {
    path: PathBuf,
    lock: Mutex<()>,
    faults: FaultPlan,
}

impl JsonFileNoteRepository {
    /// Opens the store at `path`, creating parent directories and an empty
    /// document (or one holding `seed`) when the file does not exist.
    pub fn open(
        path: impl AsRef<Path>,
        seed: impl IntoIterator<Item = Note>,
    ) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let repo = Self {
            path,
            lock: Mutex::new(()),
            faults: FaultPlan::default(),
        };
        if !repo.path.exists() {
            debug!(path = %repo.path.display(), "creating note store");
            repo.write(&NoteTable::seeded(seed))?;
        } else {
            repo.read()?;
        }
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.faults
    }

    fn read(&self) -> Result<NoteTable, RepositoryError> {
        let bytes = fs::read(&self.path)?;
        let document = serde_json::from_slice::<NoteStoreDocument>(&bytes)?;
        if document.version != STORE_DOCUMENT_VERSION {
            return Err(RepositoryError::UnsupportedVersion(document.version));
        }
        Ok(NoteTable::from_document(document))
    }

    fn write(&self, table: &NoteTable) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_vec_pretty(&table.to_document())?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Runs `apply` against the current table and persists the result.
    fn transact<T>(
        &self,
        operation: RepositoryOperation,
        apply: impl FnOnce(&mut NoteTable) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        self.faults.check(operation)?;
        let _guard = self.lock.lock().map_err(|_| RepositoryError::Poisoned)?;
        let mut table = self.read()?;
        let value = apply(&mut table)?;
        self.write(&table)?;
        Ok(value)
    }
}

impl NoteRepository for JsonFileNoteRepository {
    fn name(&self) -> &'static str {
        "json-file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch_all(&self) -> Result<Vec<Note>, RepositoryError> {
        self.faults.check(RepositoryOperation::FetchAll)?;
        let _guard = self.lock.lock().map_err(|_| RepositoryError::Poisoned)?;
        Ok(self.read()?.all())
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    fn create(&self, draft: Note) -> Result<Note, RepositoryError> {
        self.transact(RepositoryOperation::Create, |table| Ok(table.insert_new(draft)))
    }

    #[instrument(skip(self, note), fields(id = %note.id))]
    fn update(&self, note: Note) -> Result<Note, RepositoryError> {
        self.transact(RepositoryOperation::Update, |table| table.replace(note))
    }

    #[instrument(skip(self))]
    fn delete(&self, id: NoteId) -> Result<(), RepositoryError> {
        self.transact(RepositoryOperation::Delete, |table| table.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::repository::demo_notes;

    #[test]
    fn open_seeds_missing_store_and_reopens_it() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("nested/notes.json");

        let repo = JsonFileNoteRepository::open(&path, demo_notes()).expect("open");
        assert_eq!(repo.fetch_all().expect("fetch").len(), 3);

        let reopened = JsonFileNoteRepository::open(&path, Vec::new()).expect("reopen");
        let titles: Vec<String> = reopened
            .fetch_all()
            .expect("fetch")
            .into_iter()
            .map(|note| note.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Opening keynote", "Ownership in practice", "Lightning talks"]
        );
    }

    #[test]
    fn writes_are_visible_to_a_second_handle() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("notes.json");
        let writer = JsonFileNoteRepository::open(&path, Vec::new()).expect("open");
        let reader = JsonFileNoteRepository::open(&path, Vec::new()).expect("open");

        let created = writer
            .create(Note {
                title: "Async Rust".to_string(),
                ..Note::blank()
            })
            .expect("create");
        assert_eq!(reader.fetch_all().expect("fetch"), vec![created.clone()]);

        reader.delete(created.id).expect("delete");
        assert!(writer.fetch_all().expect("fetch").is_empty());
    }

    #[test]
    fn concurrent_creates_through_one_handle_are_all_kept() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("notes.json");
        let repo = JsonFileNoteRepository::open(&path, Vec::new()).expect("open");

        std::thread::scope(|scope| {
            for n in 0..8 {
                let repo = &repo;
                scope.spawn(move || {
                    repo.create(Note {
                        title: format!("talk {n}"),
                        ..Note::blank()
                    })
                    .expect("create");
                });
            }
        });

        let ids: Vec<u64> = repo
            .fetch_all()
            .expect("fetch")
            .into_iter()
            .map(|note| note.id.0)
            .collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn corrupt_store_is_reported_as_json_error() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("notes.json");
        fs::write(&path, b"not json").expect("write");
        let err = JsonFileNoteRepository::open(&path, Vec::new()).expect_err("corrupt");
        assert!(matches!(err, RepositoryError::Json(_)));
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("notes.json");
        let repo = JsonFileNoteRepository::open(&path, demo_notes()).expect("open");
        let before = fs::read(&path).expect("read");

        let err = repo
            .update(Note {
                id: NoteId(77),
                ..Note::blank()
            })
            .expect_err("missing");
        assert!(matches!(err, RepositoryError::NotFound(NoteId(77))));
        assert_eq!(fs::read(&path).expect("read"), before);
    }
}
