//! Concurrency and consistency properties of the registration engine.
//!
//! These tests drive the engine through the in-memory stores with real task
//! concurrency: many registrations racing for the same seats, duplicate
//! signups from one identity, cancel retries, and capacity edits. After
//! every scenario the ledger's maintained count must equal a recount from
//! the registration store.

use std::sync::Arc;

use chrono::NaiveDate;
use domain::error::EngineError;
use domain::models::{AuthContext, ContactInfo, NewProject, Project, RegistrationStatus};
use domain::services::{
    CapacityLedger, EngineConfig, MockNotificationSink, RegistrationEngine, SignupRequest,
};
use domain::store::memory::{InMemoryProjectStore, InMemoryRegistrationStore};
use domain::store::{ProjectStore, RegistrationStore};

struct Harness {
    engine: Arc<RegistrationEngine>,
    projects: Arc<InMemoryProjectStore>,
    registrations: Arc<InMemoryRegistrationStore>,
}

fn harness() -> Harness {
    let projects = Arc::new(InMemoryProjectStore::new());
    let registrations = Arc::new(InMemoryRegistrationStore::new());
    let engine = Arc::new(RegistrationEngine::new(
        projects.clone(),
        registrations.clone(),
        Arc::new(CapacityLedger::new()),
        Arc::new(MockNotificationSink::new()),
        EngineConfig::default(),
    ));
    Harness {
        engine,
        projects,
        registrations,
    }
}

async fn seed_project(h: &Harness, capacity: i32) -> Project {
    h.projects
        .create(NewProject {
            title: "Community garden build".to_string(),
            description: String::new(),
            project_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            location_address: "100 Main St".to_string(),
            max_capacity: capacity,
        })
        .await
        .unwrap()
}

fn signup(email: &str, guests: i32) -> SignupRequest {
    SignupRequest {
        guest_count: guests,
        lead_interest: false,
        contact: ContactInfo {
            first_name: "Test".to_string(),
            last_name: "Volunteer".to_string(),
            email: Some(email.to_string()),
            phone: None,
            text_permission: false,
        },
    }
}

/// Ledger count and store recount must agree.
async fn assert_reconciled(h: &Harness, project_id: i64) {
    let recount = h.registrations.occupied_seats(project_id).await.unwrap();
    let snapshot = h.engine.capacity_snapshot(project_id).await.unwrap();
    assert_eq!(
        snapshot.occupied, recount,
        "ledger {} != store recount {}",
        snapshot.occupied, recount
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn capacity_never_exceeded_under_concurrent_registrations() {
    let h = harness();
    let project = seed_project(&h, 10).await;

    // 30 volunteers race for 10 seats, some bringing guests.
    let mut handles = Vec::new();
    for i in 0..30 {
        let engine = h.engine.clone();
        let project_id = project.id;
        handles.push(tokio::spawn(async move {
            engine
                .register(
                    &AuthContext::anonymous(),
                    project_id,
                    signup(&format!("v{}@example.com", i), (i % 3) as i32),
                )
                .await
        }));
    }

    let mut accepted_seats = 0i64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reg) => accepted_seats += reg.seats(),
            Err(EngineError::CapacityExceeded { .. }) => {}
            Err(other) => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert!(accepted_seats <= 10, "oversold: {} seats", accepted_seats);
    let snapshot = h.engine.capacity_snapshot(project.id).await.unwrap();
    assert_eq!(snapshot.occupied, accepted_seats);
    assert_reconciled(&h, project.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn no_double_booking_for_one_identity() {
    let h = harness();
    let project = seed_project(&h, 50).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let engine = h.engine.clone();
        let project_id = project.id;
        handles.push(tokio::spawn(async move {
            engine
                .register(
                    &AuthContext::anonymous(),
                    project_id,
                    signup("jane@example.com", 0),
                )
                .await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::AlreadyRegistered { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 9);

    let rows = h.registrations.list_by_project(project.id).await.unwrap();
    let active = rows
        .iter()
        .filter(|r| r.status == RegistrationStatus::Registered)
        .count();
    assert_eq!(active, 1);
    assert_reconciled(&h, project.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn last_seat_race_has_exactly_one_winner() {
    let h = harness();
    let project = seed_project(&h, 1).await;

    let first = {
        let engine = h.engine.clone();
        let project_id = project.id;
        tokio::spawn(async move {
            engine
                .register(
                    &AuthContext::anonymous(),
                    project_id,
                    signup("first@example.com", 0),
                )
                .await
        })
    };
    let second = {
        let engine = h.engine.clone();
        let project_id = project.id;
        tokio::spawn(async move {
            engine
                .register(
                    &AuthContext::anonymous(),
                    project_id,
                    signup("second@example.com", 0),
                )
                .await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let wins = outcomes.iter().filter(|o| o.is_ok()).count();
    let capacity_rejections = outcomes
        .iter()
        .filter(|o| matches!(o, Err(EngineError::CapacityExceeded { .. })))
        .count();

    assert_eq!(wins, 1);
    assert_eq!(capacity_rejections, 1);
    assert_reconciled(&h, project.id).await;
}

#[tokio::test]
async fn cancel_and_reregister_round_trip() {
    let h = harness();
    let project = seed_project(&h, 10).await;
    let auth = AuthContext::anonymous();

    let first = h
        .engine
        .register(&auth, project.id, signup("jane@example.com", 2))
        .await
        .unwrap();
    assert_eq!(
        h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
        3
    );

    h.engine
        .cancel(&auth, project.id, Some("jane@example.com"))
        .await
        .unwrap();
    assert_eq!(
        h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
        0
    );

    let second = h
        .engine
        .register(&auth, project.id, signup("jane@example.com", 1))
        .await
        .unwrap();
    assert_ne!(first.id, second.id, "re-registration must be a new record");
    assert_eq!(
        h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
        2
    );

    // The cancelled record is retained for audit.
    let old = h.registrations.find(first.id).await.unwrap().unwrap();
    assert_eq!(old.status, RegistrationStatus::Cancelled);
    assert_reconciled(&h, project.id).await;
}

#[tokio::test]
async fn guest_count_edit_boundary() {
    let h = harness();
    let project = seed_project(&h, 5).await;
    let auth = AuthContext::anonymous();

    let reg = h
        .engine
        .register(&auth, project.id, signup("jane@example.com", 4))
        .await
        .unwrap();

    // All 5 seats occupied: growing to 5 guests (6 seats) must fail.
    let result = h
        .engine
        .update_guest_count(&auth, Some("jane@example.com"), reg.id, 5)
        .await;
    assert!(matches!(result, Err(EngineError::CapacityExceeded { .. })));
    let unchanged = h.registrations.find(reg.id).await.unwrap().unwrap();
    assert_eq!(unchanged.guest_count, 4);

    // Shrinking to 3 frees a seat, confirmed by a new solo registration.
    h.engine
        .update_guest_count(&auth, Some("jane@example.com"), reg.id, 3)
        .await
        .unwrap();
    h.engine
        .register(&auth, project.id, signup("late@example.com", 0))
        .await
        .unwrap();
    assert_reconciled(&h, project.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_cancel_retries_release_once() {
    let h = harness();
    let project = seed_project(&h, 10).await;
    let auth = AuthContext::anonymous();

    h.engine
        .register(&auth, project.id, signup("jane@example.com", 3))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let engine = h.engine.clone();
        let project_id = project.id;
        handles.push(tokio::spawn(async move {
            engine
                .cancel(
                    &AuthContext::anonymous(),
                    project_id,
                    Some("jane@example.com"),
                )
                .await
        }));
    }
    for handle in handles {
        // Every retry reports success.
        handle.await.unwrap().unwrap();
    }

    let snapshot = h.engine.capacity_snapshot(project.id).await.unwrap();
    assert_eq!(snapshot.occupied, 0, "seats must be released exactly once");
    assert_reconciled(&h, project.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn ledger_matches_recount_after_mixed_operations() {
    let h = harness();
    let project = seed_project(&h, 12).await;

    // Interleave signups, cancellations, and guest-count edits.
    let mut handles = Vec::new();
    for i in 0..10 {
        let engine = h.engine.clone();
        let project_id = project.id;
        handles.push(tokio::spawn(async move {
            let auth = AuthContext::anonymous();
            let email = format!("v{}@example.com", i);
            let registered = engine
                .register(&auth, project_id, signup(&email, (i % 2) as i32))
                .await;
            if let Ok(reg) = registered {
                match i % 3 {
                    0 => {
                        let _ = engine.cancel(&auth, project_id, Some(&email)).await;
                    }
                    1 => {
                        let _ = engine
                            .update_guest_count(&auth, Some(&email), reg.id, reg.guest_count + 1)
                            .await;
                    }
                    _ => {}
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_reconciled(&h, project.id).await;

    // An explicit reconciliation pass finds nothing to correct.
    let before = h.engine.capacity_snapshot(project.id).await.unwrap();
    let after = h.engine.reconcile(project.id).await.unwrap();
    assert_eq!(before.occupied, after.occupied);
}
