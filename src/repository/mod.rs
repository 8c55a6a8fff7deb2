// Job repository: durable key -> record storage with no business rules.
//
// Every backend enforces optimistic versioning on `put`: the incoming record
// must carry exactly the stored version plus one.

pub mod file;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::jobs::types::Job;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub use file::FileJobRepository;
pub use memory::InMemoryJobRepository;
#[cfg(feature = "database")]
pub use sqlite::SqliteJobRepository;

/// Errors that can occur in a repository backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("job {id} not found")]
    NotFound { id: String },

    #[error("job {id} already exists")]
    AlreadyExists { id: String },

    #[error("version conflict on job {id}: stored version {stored}, incoming version {incoming}")]
    VersionConflict { id: String, stored: u64, incoming: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot corruption detected: {reason}")]
    Corrupted { reason: String },

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Storage contract the job service depends on
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Fetch a job, or `StorageError::NotFound`
    async fn get(&self, id: &str) -> Result<Job, StorageError>;

    /// Insert a new job; fails with `AlreadyExists` if the id is taken
    async fn create(&self, job: &Job) -> Result<(), StorageError>;

    /// Replace an existing job (compare-and-swap on `version`)
    async fn put(&self, job: &Job) -> Result<(), StorageError>;

    /// All jobs ordered by creation time, then id
    async fn list(&self) -> Result<Vec<Job>, StorageError>;
}

/// Compare-and-swap check shared by every backend
pub(crate) fn check_version(stored: &Job, incoming: &Job) -> Result<(), StorageError> {
    if incoming.version != stored.version + 1 {
        return Err(StorageError::VersionConflict {
            id: incoming.id.clone(),
            stored: stored.version,
            incoming: incoming.version,
        });
    }
    Ok(())
}

pub(crate) fn sort_jobs(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
