//! Error types for build-plan resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

/// Fatal plan-resolution failures.
///
/// Resolution is a pure function of the project description, so none of
/// these are retried.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("pages directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("duplicate page name '{name}': {first} and {second}")]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("page '{page}' references unknown chunk '{chunk}'")]
    UnresolvedChunk { page: String, chunk: String },

    #[error("page '{page}' declares no chunks and the project has {entries} entries; list its chunks explicitly")]
    AmbiguousBinding { page: String, entries: usize },

    #[error("incomplete build plan: {0}")]
    IncompletePlan(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
