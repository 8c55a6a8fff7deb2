// Job lifecycle: record types, authorization guard and the transition table.

pub mod guard;
pub mod state_machine;
pub mod types;

pub use guard::{Decision, DenyReason};
pub use state_machine::{JobEvent, TRANSITIONS};
pub use types::{
    ActionKind, Dispute, EscrowLedger, Job, JobFilter, JobStatus, NewJob, Release, Submission,
};
