use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::guard::{self, Decision};
use super::types::{ActionKind, Dispute, Job, JobStatus, Release, Submission};
use crate::errors::{EscrowError, Result};

/// One row of the lifecycle transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: &'static [JobStatus],
    pub action: ActionKind,
    pub to: JobStatus,
}

/// The lifecycle transition table. Every action consults this table; there is
/// no other place where legal source states are decided.
pub const TRANSITIONS: &[Edge] = &[
    Edge {
        from: &[JobStatus::Open],
        action: ActionKind::Accept,
        to: JobStatus::Accepted,
    },
    Edge {
        from: &[JobStatus::Accepted],
        action: ActionKind::DepositConfirm,
        to: JobStatus::Funded,
    },
    Edge {
        from: &[JobStatus::Accepted, JobStatus::Funded],
        action: ActionKind::Submit,
        to: JobStatus::Submitted,
    },
    Edge {
        from: &[JobStatus::Submitted, JobStatus::Funded],
        action: ActionKind::ReleaseConfirm,
        to: JobStatus::Released,
    },
    // Reachable from every status, RELEASED included.
    Edge {
        from: &JobStatus::ALL,
        action: ActionKind::Dispute,
        to: JobStatus::Disputed,
    },
];

/// Events carrying the payload of a state-changing action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum JobEvent {
    Accept { freelancer_address: String },
    Submit { work_reference: String },
    Dispute { reason: String },
    DepositConfirmed { transaction_ref: String },
    ReleaseConfirmed { transaction_ref: String },
}

impl JobEvent {
    pub fn action(&self) -> ActionKind {
        match self {
            JobEvent::Accept { .. } => ActionKind::Accept,
            JobEvent::Submit { .. } => ActionKind::Submit,
            JobEvent::Dispute { .. } => ActionKind::Dispute,
            JobEvent::DepositConfirmed { .. } => ActionKind::DepositConfirm,
            JobEvent::ReleaseConfirmed { .. } => ActionKind::ReleaseConfirm,
        }
    }

    fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            JobEvent::Accept { .. } => return Ok(()),
            JobEvent::Submit { work_reference } => ("workReference", work_reference),
            JobEvent::Dispute { reason } => ("reason", reason),
            JobEvent::DepositConfirmed { transaction_ref }
            | JobEvent::ReleaseConfirmed { transaction_ref } => ("transactionRef", transaction_ref),
        };
        if value.trim().is_empty() {
            return Err(EscrowError::validation(field, "must not be empty"));
        }
        Ok(())
    }
}

/// Look up the table row governing `action`.
///
/// Prepare steps borrow the row of the confirm step they lead to, except
/// deposit-prepare which is allowed in every status.
pub fn edge_for(action: ActionKind) -> Option<&'static Edge> {
    let governing = match action {
        ActionKind::DepositPrepare => return None,
        ActionKind::ReleasePrepare => ActionKind::ReleaseConfirm,
        other => other,
    };
    TRANSITIONS.iter().find(|edge| edge.action == governing)
}

/// Status the job would move to if `action` were applied from `from`.
///
/// Prepare actions never change status, so they map to `from` when allowed.
pub fn target(from: JobStatus, action: ActionKind) -> Option<JobStatus> {
    match edge_for(action) {
        None => Some(from),
        Some(edge) if edge.from.contains(&from) => match action {
            ActionKind::ReleasePrepare => Some(from),
            _ => Some(edge.to),
        },
        Some(_) => None,
    }
}

fn requirement(action: ActionKind) -> String {
    match edge_for(action) {
        Some(edge) => {
            let states: Vec<&str> = edge.from.iter().map(JobStatus::as_str).collect();
            format!("job must be {}", states.join(" or "))
        }
        None => "no status requirement".to_string(),
    }
}

/// Check the table and the action's extra preconditions without mutating.
pub fn ensure_permitted(job: &Job, action: ActionKind) -> Result<JobStatus> {
    let next = target(job.status, action).ok_or_else(|| EscrowError::InvalidTransition {
        from: job.status,
        action,
        requirement: requirement(action),
    })?;

    if matches!(
        action,
        ActionKind::ReleasePrepare | ActionKind::ReleaseConfirm
    ) && job.freelancer_address.is_none()
    {
        return Err(EscrowError::InvalidTransition {
            from: job.status,
            action,
            requirement: "a freelancer must be assigned".to_string(),
        });
    }

    Ok(next)
}

/// Authorize `caller` for `action` on `job`.
pub fn authorize(job: &Job, caller: &str, action: ActionKind) -> Result<()> {
    match guard::authorize(action, job, caller) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(EscrowError::Forbidden { action, reason }),
    }
}

/// Apply `event` on behalf of `caller`, producing the next snapshot.
///
/// Order: payload shape, authorization guard, transition table. The input
/// record is never modified; on error nothing changes.
pub fn apply(job: &Job, caller: &str, event: &JobEvent, now: DateTime<Utc>) -> Result<Job> {
    let action = event.action();
    event.validate()?;
    authorize(job, caller, action)?;
    let next_status = ensure_permitted(job, action)?;

    let mut next = job.clone();
    next.status = next_status;
    next.updated_at = now;
    next.version = job.version + 1;

    match event {
        JobEvent::Accept { freelancer_address } => {
            next.freelancer_address = Some(freelancer_address.clone());
        }
        JobEvent::Submit { work_reference } => {
            next.submission = Some(Submission {
                work_reference: work_reference.clone(),
                at: now,
            });
        }
        JobEvent::Dispute { reason } => {
            next.dispute = Some(Dispute {
                raised_by: caller.to_string(),
                reason: reason.clone(),
                at: now,
            });
        }
        JobEvent::DepositConfirmed { transaction_ref } => {
            // Full-amount deposits only; the asserted transfer is not reconciled.
            next.escrow.deposited_amount = job.amount;
            next.escrow.transaction_refs.push(transaction_ref.clone());
        }
        JobEvent::ReleaseConfirmed { transaction_ref } => {
            next.release = Some(Release {
                transaction_ref: transaction_ref.clone(),
                at: now,
            });
        }
    }

    Ok(next)
}
