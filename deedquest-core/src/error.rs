//! Error types for the engine and the entity store.

use rusqlite::ffi;
use thiserror::Error;

use crate::models::ActivityType;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Creation quota for {activity_type} exceeded ({used}/{cap} in the last 7 days)")]
    QuotaExceeded {
        activity_type: ActivityType,
        used: usize,
        cap: u32,
    },

    #[error("Already reacted to this activity")]
    AlreadyReacted,

    #[error("Incorrect answer")]
    IncorrectAnswer,

    #[error("Puzzle already solved by this user")]
    AlreadySolved,

    #[error("Cannot interact with your own activity")]
    OwnActivity,

    #[error("Expected a {expected} activity, got {actual}")]
    WrongActivityType {
        expected: ActivityType,
        actual: ActivityType,
    },

    #[error("Challenge already resolved")]
    AlreadyResolved,

    #[error("Challenge answer already confirmed")]
    AlreadyConfirmed,

    #[error("Challenge answer is not confirmed")]
    NotConfirmed,

    #[error("Happening has already ended")]
    HappeningEnded,

    #[error("Happening has not started yet")]
    HappeningNotStarted,

    #[error("Happening has not ended yet")]
    HappeningNotEnded,

    #[error("Completion window for this happening has closed")]
    CompletionWindowClosed,

    #[error("Happening completion already submitted")]
    AlreadyCompleted,

    #[error("Happening completion has not been submitted")]
    NotCompleted,

    #[error("Not enough XP to level up")]
    NotEnoughXp,

    #[error("Skill for {0} is already at the maximum level")]
    SkillMaxed(ActivityType),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Not allowed to perform this action")]
    Unauthorized,

    #[error("Conflicting concurrent update, retry the request")]
    Conflict,

    #[error("Media service error: {0}")]
    Media(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Coarse classification that callers translate into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Unauthorized,
    Conflict,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::QuotaExceeded { .. }
            | Self::AlreadyReacted
            | Self::IncorrectAnswer
            | Self::AlreadySolved
            | Self::OwnActivity
            | Self::WrongActivityType { .. }
            | Self::AlreadyResolved
            | Self::AlreadyConfirmed
            | Self::NotConfirmed
            | Self::HappeningEnded
            | Self::HappeningNotStarted
            | Self::HappeningNotEnded
            | Self::CompletionWindowClosed
            | Self::AlreadyCompleted
            | Self::NotCompleted
            | Self::NotEnoughXp
            | Self::SkillMaxed(_)
            | Self::Invalid(_) => ErrorKind::BadRequest,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Conflict => ErrorKind::Conflict,
            Self::Media(_) | Self::Store(_) => ErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            match failure.code {
                ffi::ErrorCode::DatabaseBusy | ffi::ErrorCode::DatabaseLocked => {
                    return Self::Conflict
                }
                ffi::ErrorCode::ConstraintViolation
                    if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    return Self::Conflict
                }
                _ => {}
            }
        }
        Self::Store(err.to_string())
    }
}
