use crate::models::fight::FightType;
use crate::services::aggregate::AggregateState;
use std::path::PathBuf;
use thiserror::Error;

/// A screenshot could not be turned into a winners/losers split
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no words survived normalization")]
    NoTokens,

    #[error("no participant names found")]
    NoParticipants,

    #[error("cannot separate {candidates} participant(s) into winners and losers")]
    IndeterminateSplit { candidates: usize },
}

/// Two partial results describe different kinds of fight
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot merge a {left} fight with a {right} fight")]
pub struct ConflictError {
    pub left: FightType,
    pub right: FightType,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("result is {0} and can no longer be changed")]
    Closed(AggregateState),

    #[error("operation not allowed while result is {0}")]
    InvalidState(AggregateState),

    #[error("'{0}' is not a usable player name")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to determine data directory")]
    NoDataDir,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("vocabulary is empty")]
    EmptyVocabulary,

    #[error("anchor keyword is empty after normalization")]
    EmptyAnchor,

    #[error("anchor keyword '{0}' is not part of the vocabulary")]
    AnchorNotInVocabulary(String),

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("failed to determine config directory")]
    NoConfigDir,

    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the submission workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("submitter {0} already has a pending result")]
    AlreadyPending(String),

    #[error("submitter {0} has no pending result")]
    NoPendingResult(String),

    #[error("no screenshot to submit")]
    EmptySubmission,

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("'{0}' is not a usable player name")]
    InvalidName(String),

    #[error("pending result is {0}")]
    Closed(AggregateState),

    #[error("failed to save result, try again: {0}")]
    Persistence(#[from] StoreError),
}

impl WorkflowError {
    /// Retrying the same command may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<AggregateError> for WorkflowError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::Conflict(conflict) => Self::Conflict(conflict),
            AggregateError::Closed(state) | AggregateError::InvalidState(state) => {
                Self::Closed(state)
            }
            AggregateError::InvalidName(name) => Self::InvalidName(name),
        }
    }
}

/// Errors from roster management
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("'{0}' is not a usable player name")]
    InvalidName(String),

    #[error("'{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("no player named '{0}'")]
    UnknownPlayer(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
