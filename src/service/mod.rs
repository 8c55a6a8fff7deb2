// Job service: the caller-facing action surface over the repository,
// the lifecycle state machine and the escrow coordinator.

pub mod locks;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::errors::{EscrowError, Result};
use crate::escrow::{to_minor_units, EscrowCoordinator, EscrowSettings, UnsignedInstruction};
use crate::jobs::state_machine::{self, JobEvent};
use crate::jobs::types::{ActionKind, EscrowLedger, Job, JobFilter, JobStatus, NewJob};
use crate::repository::JobRepository;
use crate::telemetry::{create_action_span, generate_correlation_id};

pub use locks::JobLocks;

pub struct JobService {
    repository: Arc<dyn JobRepository>,
    escrow: EscrowCoordinator,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    locks: JobLocks,
}

impl std::fmt::Debug for JobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobService")
            .field("repository", &"Arc<dyn JobRepository>")
            .field("escrow", &self.escrow)
            .field("locks", &self.locks)
            .finish()
    }
}

impl JobService {
    pub fn new(repository: Arc<dyn JobRepository>, settings: EscrowSettings) -> Self {
        Self::with_sources(
            repository,
            settings,
            Arc::new(SystemClock::new()),
            Arc::new(UuidGenerator),
        )
    }

    pub fn with_sources(
        repository: Arc<dyn JobRepository>,
        settings: EscrowSettings,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            repository,
            escrow: EscrowCoordinator::new(settings),
            clock,
            ids,
            locks: JobLocks::new(),
        }
    }

    /// Open a new job in status OPEN
    pub async fn create_job(&self, new_job: NewJob) -> Result<Job> {
        if new_job.title.trim().is_empty() {
            return Err(EscrowError::validation("title", "is required"));
        }
        if new_job.client_address.is_empty() {
            return Err(EscrowError::validation("clientAddress", "is required"));
        }
        let amount = to_minor_units(new_job.amount)?;

        let now = self.clock.now();
        let job = Job {
            id: self.ids.next_id(),
            title: new_job.title,
            description: new_job.description.unwrap_or_default(),
            amount,
            client_address: new_job.client_address,
            freelancer_address: None,
            status: JobStatus::Open,
            escrow: EscrowLedger::default(),
            submission: None,
            dispute: None,
            release: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        let span = create_action_span("create-job", Some(&job.id), &generate_correlation_id());
        async {
            self.repository.create(&job).await?;
            info!(
                job.id = %job.id,
                client = %job.client_address,
                amount = job.amount,
                "Job opened"
            );
            Ok::<_, EscrowError>(job)
        }
        .instrument(span)
        .await
    }

    pub async fn get_job(&self, id: &str) -> Result<Job> {
        Ok(self.repository.get(id).await?)
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let jobs = self.repository.list().await?;
        Ok(jobs.into_iter().filter(|job| filter.matches(job)).collect())
    }

    /// Take an OPEN job; the caller becomes the freelancer
    pub async fn accept(&self, id: &str, freelancer_address: &str) -> Result<Job> {
        let event = JobEvent::Accept {
            freelancer_address: freelancer_address.to_string(),
        };
        self.transition(id, ActionKind::Accept, |job, now| {
            state_machine::apply(job, freelancer_address, &event, now)
        })
        .await
    }

    pub async fn submit(&self, id: &str, freelancer_address: &str, work_reference: &str) -> Result<Job> {
        let event = JobEvent::Submit {
            work_reference: work_reference.to_string(),
        };
        self.transition(id, ActionKind::Submit, |job, now| {
            state_machine::apply(job, freelancer_address, &event, now)
        })
        .await
    }

    pub async fn dispute(&self, id: &str, identity: &str, reason: &str) -> Result<Job> {
        let event = JobEvent::Dispute {
            reason: reason.to_string(),
        };
        self.transition(id, ActionKind::Dispute, |job, now| {
            state_machine::apply(job, identity, &event, now)
        })
        .await
    }

    /// Describe the client's deposit; never mutates the job
    pub async fn prepare_deposit(
        &self,
        id: &str,
        client_address: &str,
        amount_major: Option<f64>,
    ) -> Result<UnsignedInstruction> {
        let job = self.repository.get(id).await?;
        self.escrow
            .prepare_deposit(&job, client_address, amount_major)
            .inspect_err(|e| Self::log_rejection(id, ActionKind::DepositPrepare, e))
    }

    pub async fn confirm_deposit(&self, id: &str, client_address: &str, transaction_ref: &str) -> Result<Job> {
        self.transition(id, ActionKind::DepositConfirm, |job, now| {
            self.escrow.confirm_deposit(job, client_address, transaction_ref, now)
        })
        .await
    }

    /// Describe the payout to the freelancer; never mutates the job
    pub async fn prepare_release(&self, id: &str, client_address: &str) -> Result<UnsignedInstruction> {
        let job = self.repository.get(id).await?;
        self.escrow
            .prepare_release(&job, client_address)
            .inspect_err(|e| Self::log_rejection(id, ActionKind::ReleasePrepare, e))
    }

    pub async fn confirm_release(&self, id: &str, client_address: &str, transaction_ref: &str) -> Result<Job> {
        self.transition(id, ActionKind::ReleaseConfirm, |job, now| {
            self.escrow.confirm_release(job, client_address, transaction_ref, now)
        })
        .await
    }

    /// Load, transform and store one job inside its critical section.
    ///
    /// Nothing is written unless `step` succeeds.
    async fn transition<F>(&self, id: &str, action: ActionKind, step: F) -> Result<Job>
    where
        F: FnOnce(&Job, DateTime<Utc>) -> Result<Job>,
    {
        let span = create_action_span(action.as_str(), Some(id), &generate_correlation_id());
        async {
            let _guard = self.locks.acquire(id).await;
            let current = self.repository.get(id).await?;
            let next = step(&current, self.clock.now())
                .inspect_err(|e| Self::log_rejection(id, action, e))?;
            self.repository.put(&next).await?;

            info!(
                job.id = %id,
                action = %action,
                status.from = %current.status,
                status.to = %next.status,
                version = next.version,
                "Job transitioned"
            );
            Ok::<_, EscrowError>(next)
        }
        .instrument(span)
        .await
    }

    fn log_rejection(id: &str, action: ActionKind, error: &EscrowError) {
        warn!(
            job.id = %id,
            action = %action,
            error.kind = %error.kind(),
            "Action rejected: {}",
            error
        );
    }
}
