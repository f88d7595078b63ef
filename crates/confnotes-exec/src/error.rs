use confnotes_core::NoteId;
use thiserror::Error;

use crate::contracts::RepositoryOperation;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("note {0} not found")]
    NotFound(NoteId),

    #[error("note has no server id")]
    InvalidId,

    #[error("note store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("note store is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported note store version {0}")]
    UnsupportedVersion(u16),

    #[error("note store lock poisoned")]
    Poisoned,

    #[error("{} failed: {}", .0.label(), .1)]
    Injected(RepositoryOperation, String),
}
