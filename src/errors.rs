use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::jobs::guard::DenyReason;
use crate::jobs::types::{ActionKind, JobStatus};
use crate::repository::StorageError;

/// Stable, machine-readable error classification returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Forbidden,
    InvalidTransition,
    Misconfigured,
    StorageError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::Misconfigured => "MISCONFIGURED",
            ErrorKind::StorageError => "STORAGE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the job lifecycle and escrow flows.
///
/// Every variant is recoverable: a failed action never leaves a partially
/// applied mutation behind in the repository.
#[derive(Debug, Error)]
pub enum EscrowError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("job {id} not found")]
    NotFound { id: String },

    #[error("{action} forbidden: {reason}")]
    Forbidden {
        action: ActionKind,
        reason: DenyReason,
    },

    #[error("cannot {action} a job in status {from}: {requirement}")]
    InvalidTransition {
        from: JobStatus,
        action: ActionKind,
        requirement: String,
    },

    #[error("service misconfigured: {0}")]
    Misconfigured(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl EscrowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EscrowError::Validation { .. } => ErrorKind::ValidationError,
            EscrowError::NotFound { .. } => ErrorKind::NotFound,
            EscrowError::Forbidden { .. } => ErrorKind::Forbidden,
            EscrowError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            EscrowError::Misconfigured(_) => ErrorKind::Misconfigured,
            EscrowError::Storage(_) => ErrorKind::StorageError,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EscrowError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<StorageError> for EscrowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id } => EscrowError::NotFound { id },
            other => EscrowError::Storage(other),
        }
    }
}

pub type Result<T, E = EscrowError> = std::result::Result<T, E>;
