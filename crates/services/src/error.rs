//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, ScoreError};
use storage::import::ImportError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by quiz sessions.
///
/// None of these leave a session in an undefined state: load failures keep
/// the current state, an invalid submission keeps the session active, and a
/// persistence failure still ends the session with a locally computed score.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("failed to load questions: {0}")]
    LoadFailure(#[source] StorageError),
    #[error("failed to save result: {0}")]
    PersistenceFailure(#[source] StorageError),
    #[error("cannot submit yet: {answered} of {total} questions answered")]
    InvalidSubmission { answered: usize, total: usize },
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("question {index} does not exist in category {category}")]
    QuestionOutOfRange { category: String, index: usize },
    #[error("option {option} does not exist")]
    OptionOutOfRange { option: usize },
    #[error(transparent)]
    Result(#[from] ScoreError),
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error(transparent)]
    Invalid(#[from] QuestionError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
