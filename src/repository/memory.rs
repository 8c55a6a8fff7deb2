use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{check_version, sort_jobs, JobRepository, StorageError};
use crate::jobs::types::Job;

/// Process-local repository, used for tests and the `memory` storage backend
#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn get(&self, id: &str) -> Result<Job, StorageError> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    async fn create(&self, job: &Job) -> Result<(), StorageError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StorageError::AlreadyExists { id: job.id.clone() });
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn put(&self, job: &Job) -> Result<(), StorageError> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get(&job.id)
            .ok_or_else(|| StorageError::NotFound { id: job.id.clone() })?;
        check_version(stored, job)?;
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Job>, StorageError> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        sort_jobs(&mut jobs);
        Ok(jobs)
    }
}
