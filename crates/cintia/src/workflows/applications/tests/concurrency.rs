use std::sync::Arc;

use super::common::{ctx, harness};
use crate::workflows::applications::{
    ApplicationServiceError, ApplicationStatus, ApplicationUpdate, CreateApplicationInput,
};

const CONTENDERS: usize = 32;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_for_one_pair_yield_single_record() {
    let h = harness();
    let barrier = Arc::new(tokio::sync::Barrier::new(CONTENDERS));

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let service = h.service.clone();
            let barrier = barrier.clone();
            let (user_id, job_id) = (h.user_id, h.job_id);
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .create_application(&ctx(), user_id, CreateApplicationInput::new(job_id))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => created += 1,
            Err(ApplicationServiceError::AlreadyApplied { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, CONTENDERS - 1);
    assert_eq!(h.repository.len().expect("len"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transitions_from_same_state_admit_one_winner() {
    let h = harness();
    let application = h.apply().await;
    let barrier = Arc::new(tokio::sync::Barrier::new(CONTENDERS));

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let service = h.service.clone();
            let barrier = barrier.clone();
            let id = application.id;
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .update_application_status(&ctx(), id, ApplicationStatus::Interviewing)
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(()) => winners += 1,
            Err(ApplicationServiceError::InvalidTransition { from, to }) => {
                assert_eq!(from, ApplicationStatus::Interviewing);
                assert_eq!(to, ApplicationStatus::Interviewing);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(
        h.stored(application.id).await.status,
        ApplicationStatus::Interviewing
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn field_edits_racing_a_transition_all_succeed() {
    let h = harness();
    let application = h.apply().await;
    let barrier = Arc::new(tokio::sync::Barrier::new(CONTENDERS + 1));

    let edits: Vec<_> = (0..CONTENDERS)
        .map(|n| {
            let service = h.service.clone();
            let barrier = barrier.clone();
            let id = application.id;
            tokio::spawn(async move {
                barrier.wait().await;
                let updates = ApplicationUpdate::new().notes(format!("edit {n}"));
                service.update_application(&ctx(), id, updates).await
            })
        })
        .collect();

    let service = h.service.clone();
    let id = application.id;
    let transition = tokio::spawn(async move {
        barrier.wait().await;
        service
            .update_application_status(&ctx(), id, ApplicationStatus::Interviewing)
            .await
    });

    for handle in edits {
        handle
            .await
            .expect("task completes")
            .expect("field edit never reports a transition");
    }
    transition
        .await
        .expect("task completes")
        .expect("applied -> interviewing");

    let stored = h.stored(application.id).await;
    assert_eq!(stored.status, ApplicationStatus::Interviewing);
    assert!(stored.notes.is_some_and(|notes| notes.starts_with("edit ")));
}
