//! End-to-end lifecycle scenarios against the job service
//!
//! Each test drives a job through the public service API with an in-memory
//! repository and checks the resulting records and error kinds.

use job_escrow::{
    EscrowSettings, ErrorKind, InMemoryJobRepository, InstructionKind, Job, JobFilter,
    JobRepository, JobService, JobStatus, NewJob, UnsignedInstruction,
};
use std::sync::Arc;

const CLIENT: &str = "C1";
const FREELANCER: &str = "F1";
const ESCROW: &str = "ESCROW";

struct Harness {
    repository: Arc<InMemoryJobRepository>,
    service: JobService,
}

impl Harness {
    fn new() -> Self {
        Self::with_settings(EscrowSettings::with_destination(ESCROW))
    }

    fn with_settings(settings: EscrowSettings) -> Self {
        let repository = Arc::new(InMemoryJobRepository::new());
        let service = JobService::new(repository.clone(), settings);
        Self { repository, service }
    }

    async fn open_job(&self, amount: f64) -> Job {
        self.service
            .create_job(NewJob {
                title: "Design a logo".into(),
                amount,
                client_address: CLIENT.into(),
                description: Some("Vector logo for a bakery".into()),
            })
            .await
            .unwrap()
    }

    async fn funded_job(&self) -> Job {
        let job = self.open_job(10.0).await;
        self.service.accept(&job.id, FREELANCER).await.unwrap();
        self.service.confirm_deposit(&job.id, CLIENT, "0xabc").await.unwrap()
    }

    async fn stored(&self, id: &str) -> Job {
        self.repository.get(id).await.unwrap()
    }
}

#[tokio::test]
async fn full_round_trip_reaches_released() {
    let h = Harness::new();
    let job = h.open_job(10.0).await;
    assert_eq!(job.status, JobStatus::Open);
    assert_eq!(job.amount, 10_000_000);

    let accepted = h.service.accept(&job.id, FREELANCER).await.unwrap();
    assert_eq!(accepted.status, JobStatus::Accepted);
    assert_eq!(accepted.freelancer_address.as_deref(), Some(FREELANCER));

    let deposit = h.service.prepare_deposit(&job.id, CLIENT, Some(10.0)).await.unwrap();
    assert_eq!(
        deposit,
        UnsignedInstruction {
            kind: InstructionKind::Transfer,
            destination: ESCROW.into(),
            amount: 10_000_000,
        }
    );

    let funded = h.service.confirm_deposit(&job.id, CLIENT, "0xabc").await.unwrap();
    assert_eq!(funded.status, JobStatus::Funded);
    assert_eq!(funded.escrow.transaction_refs, vec!["0xabc".to_string()]);
    assert_eq!(funded.escrow.deposited_amount, 10_000_000);

    let submitted = h.service.submit(&job.id, FREELANCER, "ipfs://logo").await.unwrap();
    assert_eq!(submitted.status, JobStatus::Submitted);
    assert_eq!(
        submitted.submission.as_ref().map(|s| s.work_reference.as_str()),
        Some("ipfs://logo")
    );

    let payout = h.service.prepare_release(&job.id, CLIENT).await.unwrap();
    assert_eq!(payout.destination, FREELANCER);
    assert_eq!(payout.amount, 10_000_000);

    let released = h.service.confirm_release(&job.id, CLIENT, "0xdef").await.unwrap();
    assert_eq!(released.status, JobStatus::Released);
    assert_eq!(
        released.release.as_ref().map(|r| r.transaction_ref.as_str()),
        Some("0xdef")
    );
    assert!(released.updated_at >= released.created_at);
    assert_eq!(h.stored(&job.id).await, released);
}

#[tokio::test]
async fn second_accept_is_an_invalid_transition() {
    let h = Harness::new();
    let job = h.open_job(1.0).await;
    h.service.accept(&job.id, FREELANCER).await.unwrap();

    let err = h.service.accept(&job.id, "F2").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(
        h.stored(&job.id).await.freelancer_address.as_deref(),
        Some(FREELANCER)
    );
}

#[tokio::test]
async fn accept_without_identity_is_forbidden() {
    let h = Harness::new();
    let job = h.open_job(1.0).await;

    let err = h.service.accept(&job.id, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(h.stored(&job.id).await.status, JobStatus::Open);
}

#[tokio::test]
async fn non_client_deposit_confirm_is_forbidden() {
    let h = Harness::new();
    let job = h.open_job(10.0).await;
    h.service.accept(&job.id, FREELANCER).await.unwrap();

    let err = h
        .service
        .confirm_deposit(&job.id, FREELANCER, "0xabc")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let stored = h.stored(&job.id).await;
    assert_eq!(stored.status, JobStatus::Accepted);
    assert!(stored.escrow.transaction_refs.is_empty());
    assert_eq!(stored.escrow.deposited_amount, 0);
}

#[tokio::test]
async fn release_prepare_before_assignment_fails() {
    let h = Harness::new();
    let job = h.open_job(10.0).await;

    let err = h.service.prepare_release(&job.id, CLIENT).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn release_confirm_requires_submitted_or_funded() {
    let h = Harness::new();
    let job = h.open_job(10.0).await;
    h.service.accept(&job.id, FREELANCER).await.unwrap();

    let err = h
        .service
        .confirm_release(&job.id, CLIENT, "0xdef")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(h.stored(&job.id).await.release.is_none());
}

#[tokio::test]
async fn release_directly_from_funded_is_allowed() {
    let h = Harness::new();
    let job = h.funded_job().await;

    let released = h.service.confirm_release(&job.id, CLIENT, "0xdef").await.unwrap();
    assert_eq!(released.status, JobStatus::Released);
    assert!(released.submission.is_none());
}

#[tokio::test]
async fn deposit_prepare_is_idempotent_and_defaults_to_job_amount() {
    let h = Harness::new();
    let job = h.open_job(2.5).await;

    let first = h.service.prepare_deposit(&job.id, CLIENT, None).await.unwrap();
    let second = h.service.prepare_deposit(&job.id, CLIENT, None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.amount, 2_500_000);
    assert_eq!(h.stored(&job.id).await, job);
}

#[tokio::test]
async fn deposit_prepare_without_destination_is_misconfigured() {
    let h = Harness::with_settings(EscrowSettings::default());
    let job = h.open_job(1.0).await;

    let err = h.service.prepare_deposit(&job.id, CLIENT, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Misconfigured);
}

#[tokio::test]
async fn submit_by_non_acceptor_is_forbidden() {
    let h = Harness::new();
    let job = h.open_job(1.0).await;
    h.service.accept(&job.id, FREELANCER).await.unwrap();

    let err = h.service.submit(&job.id, "F2", "ipfs://x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let stored = h.stored(&job.id).await;
    assert_eq!(stored.status, JobStatus::Accepted);
    assert!(stored.submission.is_none());
}

#[tokio::test]
async fn empty_work_reference_is_a_validation_error() {
    let h = Harness::new();
    let job = h.open_job(1.0).await;
    h.service.accept(&job.id, FREELANCER).await.unwrap();

    let err = h.service.submit(&job.id, FREELANCER, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn dispute_after_release_keeps_release_record() {
    let h = Harness::new();
    let job = h.funded_job().await;
    h.service.confirm_release(&job.id, CLIENT, "0xdef").await.unwrap();

    let disputed = h
        .service
        .dispute(&job.id, FREELANCER, "payout never arrived")
        .await
        .unwrap();
    assert_eq!(disputed.status, JobStatus::Disputed);
    assert!(disputed.release.is_some());
    assert_eq!(
        disputed.dispute.as_ref().map(|d| d.raised_by.as_str()),
        Some(FREELANCER)
    );
}

#[tokio::test]
async fn outsider_cannot_dispute() {
    let h = Harness::new();
    let job = h.funded_job().await;

    let err = h.service.dispute(&job.id, "X9", "not mine").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(h.stored(&job.id).await.status, JobStatus::Funded);
}

#[tokio::test]
async fn client_may_dispute_an_open_job() {
    let h = Harness::new();
    let job = h.open_job(1.0).await;

    let disputed = h.service.dispute(&job.id, CLIENT, "changed scope").await.unwrap();
    assert_eq!(disputed.status, JobStatus::Disputed);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let h = Harness::new();
    let err = h.service.accept("missing", FREELANCER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_filters_by_status_and_participants() {
    let h = Harness::new();
    let open = h.open_job(1.0).await;
    let funded = h.funded_job().await;

    let all = h.service.list_jobs(&JobFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let only_funded = h
        .service
        .list_jobs(&JobFilter {
            status: Some(JobStatus::Funded),
            ..JobFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(only_funded.len(), 1);
    assert_eq!(only_funded[0].id, funded.id);

    let by_freelancer = h
        .service
        .list_jobs(&JobFilter {
            freelancer_address: Some(FREELANCER.into()),
            ..JobFilter::default()
        })
        .await
        .unwrap();
    assert!(by_freelancer.iter().all(|job| job.id != open.id));
}

#[tokio::test]
async fn every_transition_bumps_the_version() {
    let h = Harness::new();
    let job = h.open_job(1.0).await;
    assert_eq!(job.version, 1);

    let accepted = h.service.accept(&job.id, FREELANCER).await.unwrap();
    assert_eq!(accepted.version, 2);

    let funded = h.service.confirm_deposit(&job.id, CLIENT, "0x1").await.unwrap();
    assert_eq!(funded.version, 3);
}
