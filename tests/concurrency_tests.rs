//! Concurrent actions on one job are serialized

use futures::future::join_all;
use job_escrow::{
    EscrowSettings, ErrorKind, FileJobRepository, InMemoryJobRepository, JobRepository, JobService,
    JobStatus, NewJob,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn open_job(service: &JobService) -> String {
    service
        .create_job(NewJob {
            title: "Translate docs".into(),
            amount: 5.0,
            client_address: "C1".into(),
            description: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_have_exactly_one_winner() {
    let repository = Arc::new(InMemoryJobRepository::new());
    let service = Arc::new(JobService::new(repository.clone(), EscrowSettings::default()));
    let id = open_job(&service).await;

    let handles = (0..16).map(|n| {
        let service = service.clone();
        let id = id.clone();
        tokio::spawn(async move { service.accept(&id, &format!("F{n}")).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    let stored = repository.get(&id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Accepted);
    assert_eq!(stored.freelancer_address, winners[0].freelancer_address);
    assert_eq!(stored.version, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposit_confirms_record_a_single_reference() {
    let repository = Arc::new(InMemoryJobRepository::new());
    let service = Arc::new(JobService::new(repository.clone(), EscrowSettings::default()));
    let id = open_job(&service).await;
    service.accept(&id, "F1").await.unwrap();

    let attempts = (0..8).map(|n| {
        let service = service.clone();
        let id = id.clone();
        async move { service.confirm_deposit(&id, "C1", &format!("0x{n}")).await }
    });
    let succeeded = join_all(attempts)
        .await
        .into_iter()
        .filter(Result::is_ok)
        .count();

    assert_eq!(succeeded, 1);
    let stored = repository.get(&id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Funded);
    assert_eq!(stored.escrow.transaction_refs.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_services_sharing_a_file_store_still_serialize() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jobs.json");
    let first = Arc::new(JobService::new(
        Arc::new(FileJobRepository::open(&path).unwrap()),
        EscrowSettings::default(),
    ));
    let second = Arc::new(JobService::new(
        Arc::new(FileJobRepository::open(&path).unwrap()),
        EscrowSettings::default(),
    ));
    let id = open_job(&first).await;

    let a = {
        let (service, id) = (first.clone(), id.clone());
        tokio::spawn(async move { service.accept(&id, "F1").await })
    };
    let b = {
        let (service, id) = (second.clone(), id.clone());
        tokio::spawn(async move { service.accept(&id, "F2").await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert!(a.is_ok() ^ b.is_ok());
    let loser = if a.is_ok() { b } else { a };
    // The losing writer either saw ACCEPTED or lost the version race.
    let kind = loser.unwrap_err().kind();
    assert!(matches!(kind, ErrorKind::InvalidTransition | ErrorKind::StorageError));

    let stored = FileJobRepository::open(&path).unwrap().get(&id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Accepted);
    assert_eq!(stored.version, 2);
}
