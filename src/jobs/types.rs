// Core types for the job lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle states of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Created by the client, waiting for a freelancer
    Open,
    /// A freelancer has taken the job
    Accepted,
    /// The client's deposit has been confirmed
    Funded,
    /// The freelancer has delivered work
    Submitted,
    /// A participant raised a dispute
    Disputed,
    /// Payment has been released to the freelancer
    Released,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Open,
        JobStatus::Accepted,
        JobStatus::Funded,
        JobStatus::Submitted,
        JobStatus::Disputed,
        JobStatus::Released,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "OPEN",
            JobStatus::Accepted => "ACCEPTED",
            JobStatus::Funded => "FUNDED",
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::Disputed => "DISPUTED",
            JobStatus::Released => "RELEASED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown job status '{s}'"))
    }
}

/// Actions a caller can request against an existing job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Accept,
    Submit,
    Dispute,
    DepositPrepare,
    DepositConfirm,
    ReleasePrepare,
    ReleaseConfirm,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Accept => "accept",
            ActionKind::Submit => "submit",
            ActionKind::Dispute => "dispute",
            ActionKind::DepositPrepare => "deposit-prepare",
            ActionKind::DepositConfirm => "deposit-confirm",
            ActionKind::ReleasePrepare => "release-prepare",
            ActionKind::ReleaseConfirm => "release-confirm",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escrow bookkeeping recorded from confirmed deposits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowLedger {
    pub deposited_amount: u64,
    pub transaction_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub work_reference: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub raised_by: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub transaction_ref: String,
    pub at: DateTime<Utc>,
}

/// The central job record.
///
/// Records are treated as immutable snapshots: every transition produces a
/// new `Job` with `version` bumped by one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Amount in minor units
    pub amount: u64,
    pub client_address: String,
    pub freelancer_address: Option<String>,
    pub status: JobStatus,
    pub escrow: EscrowLedger,
    pub submission: Option<Submission>,
    pub dispute: Option<Dispute>,
    pub release: Option<Release>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "initial_version")]
    pub version: u64,
}

fn initial_version() -> u64 {
    1
}

impl Job {
    pub fn is_client(&self, identity: &str) -> bool {
        self.client_address == identity
    }

    pub fn is_freelancer(&self, identity: &str) -> bool {
        self.freelancer_address.as_deref() == Some(identity)
    }
}

/// Input for opening a new job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    /// Amount in major units
    pub amount: f64,
    pub client_address: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Exact-match filter for listing jobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub client_address: Option<String>,
    #[serde(default)]
    pub freelancer_address: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.status.map_or(true, |status| job.status == status)
            && self
                .client_address
                .as_deref()
                .map_or(true, |client| job.client_address == client)
            && self
                .freelancer_address
                .as_deref()
                .map_or(true, |freelancer| job.freelancer_address.as_deref() == Some(freelancer))
    }
}
