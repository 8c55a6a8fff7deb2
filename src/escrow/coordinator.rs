// Two-phase escrow flows. Prepare steps only describe a transfer; confirm steps
// record the externally attested outcome and advance the lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instruction::{to_minor_units, UnsignedInstruction};
use crate::errors::{EscrowError, Result};
use crate::jobs::state_machine::{self, JobEvent};
use crate::jobs::types::{ActionKind, Job};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSettings {
    /// Identity that receives deposits
    pub destination_address: Option<String>,
}

impl EscrowSettings {
    pub fn with_destination(destination: impl Into<String>) -> Self {
        Self {
            destination_address: Some(destination.into()),
        }
    }

    fn destination(&self) -> Result<&str> {
        self.destination_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .ok_or_else(|| EscrowError::Misconfigured("escrow destination address is not configured".into()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EscrowCoordinator {
    settings: EscrowSettings,
}

impl EscrowCoordinator {
    pub fn new(settings: EscrowSettings) -> Self {
        Self { settings }
    }

    /// Describe the client's deposit into escrow.
    ///
    /// Allowed in any status so a wallet can retry before signing. When no
    /// amount is given the job's recorded amount is used.
    pub fn prepare_deposit(
        &self,
        job: &Job,
        payer: &str,
        amount_major: Option<f64>,
    ) -> Result<UnsignedInstruction> {
        state_machine::authorize(job, payer, ActionKind::DepositPrepare)?;
        state_machine::ensure_permitted(job, ActionKind::DepositPrepare)?;

        let amount = match amount_major {
            Some(major) => to_minor_units(major)?,
            None => job.amount,
        };
        if amount == 0 {
            return Err(EscrowError::Misconfigured(format!(
                "no deposit amount available for job {}",
                job.id
            )));
        }
        let destination = self.settings.destination()?;

        Ok(UnsignedInstruction::transfer(destination, amount))
    }

    /// Record a deposit the client asserts was executed, moving the job to FUNDED.
    pub fn confirm_deposit(
        &self,
        job: &Job,
        payer: &str,
        transaction_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Job> {
        state_machine::apply(
            job,
            payer,
            &JobEvent::DepositConfirmed {
                transaction_ref: transaction_ref.to_string(),
            },
            now,
        )
    }

    /// Describe the payout from escrow to the assigned freelancer.
    pub fn prepare_release(&self, job: &Job, client: &str) -> Result<UnsignedInstruction> {
        state_machine::authorize(job, client, ActionKind::ReleasePrepare)?;
        state_machine::ensure_permitted(job, ActionKind::ReleasePrepare)?;

        let freelancer = job.freelancer_address.as_deref().ok_or_else(|| {
            EscrowError::InvalidTransition {
                from: job.status,
                action: ActionKind::ReleasePrepare,
                requirement: "a freelancer must be assigned".into(),
            }
        })?;

        Ok(UnsignedInstruction::transfer(freelancer, job.amount))
    }

    /// Record the payout the client asserts was executed, moving the job to RELEASED.
    pub fn confirm_release(
        &self,
        job: &Job,
        client: &str,
        transaction_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Job> {
        state_machine::apply(
            job,
            client,
            &JobEvent::ReleaseConfirmed {
                transaction_ref: transaction_ref.to_string(),
            },
            now,
        )
    }
}
