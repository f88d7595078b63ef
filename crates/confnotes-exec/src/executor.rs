use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use confnotes_core::reduce;
use confnotes_core::NoteId;
use confnotes_core::NotesEffect;
use confnotes_core::NotesEvent;
use confnotes_core::NotesState;
use confnotes_core::RepositoryEvent;
use confnotes_core::RepositoryFailure;
use tracing::debug;
use tracing::info_span;

use crate::error::RepositoryError;
use crate::repository::NoteRepository;

/// Turns reducer effects into repository calls and their outcomes back into
/// events.
#[derive(Clone)]
pub struct EffectExecutor {
    repository: Arc<dyn NoteRepository>,
    latency: Duration,
}

impl EffectExecutor {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self {
            repository,
            latency: Duration::ZERO,
        }
    }

    /// Sleeps before every call; lets the shell show in-flight states.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn repository(&self) -> &dyn NoteRepository {
        self.repository.as_ref()
    }

    pub fn execute(&self, effect: NotesEffect) -> NotesEvent {
        let request = effect.request();
        let span = info_span!(
            "effect",
            %request,
            kind = effect.label(),
            repository = self.repository.name()
        );
        let _entered = span.enter();
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        let event = match effect {
            NotesEffect::FetchAll { request } => RepositoryEvent::NotesFetched {
                request,
                result: self.repository.fetch_all().map_err(into_failure),
            },
            NotesEffect::Create { request, draft } => RepositoryEvent::NoteSaved {
                request,
                target: NoteId::UNSAVED,
                result: self.repository.create(draft).map_err(into_failure),
            },
            NotesEffect::Update { request, note } => {
                let target = note.id;
                RepositoryEvent::NoteSaved {
                    request,
                    target,
                    result: self.repository.update(note).map_err(into_failure),
                }
            }
            NotesEffect::Delete { request, id } => RepositoryEvent::NoteDeleted {
                request,
                id,
                result: self.repository.delete(id).map_err(into_failure),
            },
        };
        debug!(ok = event.is_ok(), "effect completed");
        NotesEvent::Repository(event)
    }
}

fn into_failure(err: RepositoryError) -> RepositoryFailure {
    RepositoryFailure::new(err.to_string())
}

/// Runs effects on worker threads and reports outcomes over a channel, so
/// the event loop never blocks on the repository.
#[derive(Clone)]
pub struct EffectDispatcher {
    executor: Arc<EffectExecutor>,
    tx: Sender<NotesEvent>,
}

impl EffectDispatcher {
    pub fn new(executor: EffectExecutor, tx: Sender<NotesEvent>) -> Self {
        Self {
            executor: Arc::new(executor),
            tx,
        }
    }

    pub fn dispatch(&self, effect: NotesEffect) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = executor.execute(effect);
            // The receiver is gone once the shell has exited.
            let _ = tx.send(event);
        })
    }
}

/// Executes `effect` and everything it leads to, one at a time, until the
/// reducer goes idle. Returns the number of repository calls made.
pub fn drive(
    state: &mut NotesState,
    effect: Option<NotesEffect>,
    executor: &EffectExecutor,
) -> usize {
    let mut queue: VecDeque<NotesEffect> = effect.into_iter().collect();
    let mut executed = 0;
    while let Some(next) = queue.pop_front() {
        let event = executor.execute(next);
        executed += 1;
        queue.extend(reduce(state, event));
    }
    executed
}
