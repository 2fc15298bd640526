//! Shared error types for the services crate.

use thiserror::Error;

use hanzi_core::model::{AchievementId, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error("user not found: {0}")]
    NotFound(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AchievementService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AchievementServiceError {
    #[error("unknown achievement: {0}")]
    Unknown(AchievementId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the in-memory game session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no characters available for session")]
    Empty,
    #[error("session has not been started")]
    NotStarted,
    #[error("session already started")]
    AlreadyStarted,
    #[error("session already completed")]
    Completed,
    #[error("session is not finished yet")]
    InProgress,
    #[error("answer is not one of the offered options: {0}")]
    UnknownOption(String),
    #[error("a previous answer has not been saved yet")]
    AnswerPending,
}

/// Errors emitted by `GameLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    User(#[from] UserServiceError),
    #[error(transparent)]
    Achievement(#[from] AchievementServiceError),
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
