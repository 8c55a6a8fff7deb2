// Authorization guard: pure role checks against the identities recorded on a job.
//
// Identities are opaque strings compared exactly. Nothing here verifies a
// signature; the guard only checks that the caller *claims* the right role.

use serde::{Deserialize, Serialize};

use super::types::{ActionKind, Job};

/// Why a caller was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No identity was supplied
    MissingIdentity,
    /// Caller is not the job's client
    NotClient,
    /// Caller is not the job's assigned freelancer
    NotFreelancer,
    /// Caller is neither client nor freelancer
    NotParticipant,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::MissingIdentity => "missing_identity",
            DenyReason::NotClient => "not_client",
            DenyReason::NotFreelancer => "not_freelancer",
            DenyReason::NotParticipant => "not_participant",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            DenyReason::MissingIdentity => "caller identity is missing",
            DenyReason::NotClient => "caller is not the job's client",
            DenyReason::NotFreelancer => "caller is not the job's assigned freelancer",
            DenyReason::NotParticipant => "caller is neither the client nor the freelancer",
        };
        write!(f, "{message} ({})", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

fn present(identity: &str) -> Result<&str, DenyReason> {
    if identity.is_empty() {
        Err(DenyReason::MissingIdentity)
    } else {
        Ok(identity)
    }
}

fn decide(check: Result<(), DenyReason>) -> Decision {
    match check {
        Ok(()) => Decision::Allow,
        Err(reason) => Decision::Deny(reason),
    }
}

/// Anyone with an identity may take an open job
pub fn can_accept(_job: &Job, caller: &str) -> Decision {
    decide(present(caller).map(|_| ()))
}

/// Only the assigned freelancer may submit work
pub fn can_submit(job: &Job, caller: &str) -> Decision {
    decide(present(caller).and_then(|caller| {
        if job.is_freelancer(caller) {
            Ok(())
        } else {
            Err(DenyReason::NotFreelancer)
        }
    }))
}

/// Client or freelancer may raise a dispute
pub fn can_dispute(job: &Job, caller: &str) -> Decision {
    decide(present(caller).and_then(|caller| {
        if job.is_client(caller) || job.is_freelancer(caller) {
            Ok(())
        } else {
            Err(DenyReason::NotParticipant)
        }
    }))
}

/// Deposit and release steps belong to the client
pub fn can_move_funds(job: &Job, caller: &str) -> Decision {
    decide(present(caller).and_then(|caller| {
        if job.is_client(caller) {
            Ok(())
        } else {
            Err(DenyReason::NotClient)
        }
    }))
}

/// Dispatch to the predicate for `action`
pub fn authorize(action: ActionKind, job: &Job, caller: &str) -> Decision {
    match action {
        ActionKind::Accept => can_accept(job, caller),
        ActionKind::Submit => can_submit(job, caller),
        ActionKind::Dispute => can_dispute(job, caller),
        ActionKind::DepositPrepare
        | ActionKind::DepositConfirm
        | ActionKind::ReleasePrepare
        | ActionKind::ReleaseConfirm => can_move_funds(job, caller),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::{EscrowLedger, JobStatus};
    use chrono::Utc;

    fn job(freelancer: Option<&str>) -> Job {
        let now = Utc::now();
        Job {
            id: "j1".into(),
            title: "Audit".into(),
            description: String::new(),
            amount: 1_000_000,
            client_address: "C1".into(),
            freelancer_address: freelancer.map(str::to_string),
            status: JobStatus::Open,
            escrow: EscrowLedger::default(),
            submission: None,
            dispute: None,
            release: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    #[test]
    fn empty_identity_is_always_denied() {
        let job = job(Some("F1"));
        for action in [
            ActionKind::Accept,
            ActionKind::Submit,
            ActionKind::Dispute,
            ActionKind::DepositPrepare,
            ActionKind::ReleaseConfirm,
        ] {
            assert_eq!(
                authorize(action, &job, ""),
                Decision::Deny(DenyReason::MissingIdentity),
                "{action}"
            );
        }
    }

    #[test]
    fn submit_requires_assigned_freelancer() {
        assert_eq!(
            can_submit(&job(None), "F1"),
            Decision::Deny(DenyReason::NotFreelancer)
        );
        assert_eq!(
            can_submit(&job(Some("F1")), "F2"),
            Decision::Deny(DenyReason::NotFreelancer)
        );
        assert!(can_submit(&job(Some("F1")), "F1").is_allowed());
    }

    #[test]
    fn identities_compare_exactly() {
        let job = job(Some("0xAbC"));
        assert_eq!(
            can_move_funds(&job, "c1"),
            Decision::Deny(DenyReason::NotClient)
        );
        assert_eq!(
            can_dispute(&job, "0xabc"),
            Decision::Deny(DenyReason::NotParticipant)
        );
        assert!(can_dispute(&job, "0xAbC").is_allowed());
        assert!(can_dispute(&job, "C1").is_allowed());
    }

    #[test]
    fn client_may_accept_own_job() {
        assert!(can_accept(&job(None), "C1").is_allowed());
    }
}
