//! Transport-agnostic request/response envelopes for the job service.
//!
//! A front end (the CLI here, an HTTP layer elsewhere) deserializes an
//! [`ActionRequest`], hands it to [`dispatch`], and serializes the resulting
//! [`ActionResponse`]. Failures always carry a stable error kind.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, EscrowError};
use crate::escrow::UnsignedInstruction;
use crate::jobs::types::{Job, JobFilter, NewJob};
use crate::service::JobService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionRequest {
    CreateJob(NewJob),
    #[serde(rename_all = "camelCase")]
    GetJob { id: String },
    ListJobs(JobFilter),
    #[serde(rename_all = "camelCase")]
    Accept { id: String, freelancer_address: String },
    #[serde(rename_all = "camelCase")]
    Submit {
        id: String,
        freelancer_address: String,
        work_reference: String,
    },
    #[serde(rename_all = "camelCase")]
    Dispute {
        id: String,
        identity: String,
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    DepositPrepare {
        id: String,
        client_address: String,
        #[serde(default)]
        amount: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    DepositConfirm {
        id: String,
        client_address: String,
        transaction_ref: String,
    },
    #[serde(rename_all = "camelCase")]
    ReleasePrepare { id: String, client_address: String },
    #[serde(rename_all = "camelCase")]
    ReleaseConfirm {
        id: String,
        client_address: String,
        transaction_ref: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EscrowError> for ErrorBody {
    fn from(err: &EscrowError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResponse {
    Job { ok: bool, job: Box<Job> },
    Jobs { ok: bool, jobs: Vec<Job> },
    Instruction { ok: bool, instruction: UnsignedInstruction },
    Error { ok: bool, error: ErrorBody },
}

impl ActionResponse {
    pub fn is_ok(&self) -> bool {
        !matches!(self, ActionResponse::Error { .. })
    }

    pub fn error(err: &EscrowError) -> Self {
        ActionResponse::Error {
            ok: false,
            error: err.into(),
        }
    }

    fn job(job: Job) -> Self {
        ActionResponse::Job {
            ok: true,
            job: Box::new(job),
        }
    }
}

/// Run one request against the service
pub async fn dispatch(service: &JobService, request: ActionRequest) -> ActionResponse {
    let outcome = match request {
        ActionRequest::CreateJob(new_job) => service.create_job(new_job).await.map(ActionResponse::job),
        ActionRequest::GetJob { id } => service.get_job(&id).await.map(ActionResponse::job),
        ActionRequest::ListJobs(filter) => service
            .list_jobs(&filter)
            .await
            .map(|jobs| ActionResponse::Jobs { ok: true, jobs }),
        ActionRequest::Accept {
            id,
            freelancer_address,
        } => service
            .accept(&id, &freelancer_address)
            .await
            .map(ActionResponse::job),
        ActionRequest::Submit {
            id,
            freelancer_address,
            work_reference,
        } => service
            .submit(&id, &freelancer_address, &work_reference)
            .await
            .map(ActionResponse::job),
        ActionRequest::Dispute {
            id,
            identity,
            reason,
        } => service
            .dispute(&id, &identity, &reason)
            .await
            .map(ActionResponse::job),
        ActionRequest::DepositPrepare {
            id,
            client_address,
            amount,
        } => service
            .prepare_deposit(&id, &client_address, amount)
            .await
            .map(|instruction| ActionResponse::Instruction {
                ok: true,
                instruction,
            }),
        ActionRequest::DepositConfirm {
            id,
            client_address,
            transaction_ref,
        } => service
            .confirm_deposit(&id, &client_address, &transaction_ref)
            .await
            .map(ActionResponse::job),
        ActionRequest::ReleasePrepare { id, client_address } => service
            .prepare_release(&id, &client_address)
            .await
            .map(|instruction| ActionResponse::Instruction {
                ok: true,
                instruction,
            }),
        ActionRequest::ReleaseConfirm {
            id,
            client_address,
            transaction_ref,
        } => service
            .confirm_release(&id, &client_address, &transaction_ref)
            .await
            .map(ActionResponse::job),
    };

    outcome.unwrap_or_else(|err| ActionResponse::error(&err))
}
