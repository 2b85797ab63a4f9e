//! # Lifecycle Engine Tests
//!
//! Status changes against an in-memory database: the transition policy,
//! forced overrides, cache/ledger agreement and soft deletion.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use polex_core::ExceptionId;
use polex_state::{is_valid_transition, ExceptionStatus, NewException};
use polex_store::db::{self, status_changes};
use polex_store::{lifecycle, SqlitePool, StoreError};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn new_exception() -> NewException {
    NewException {
        username: "ccspapp".into(),
        submitted_date: today(),
        start_date: today(),
        end_date: today().checked_add_days(Days::new(365)).unwrap(),
        service: "myriad".into(),
        exception_type: "quota".into(),
        detail: "5TB Scratch".into(),
    }
}

async fn submitted() -> (SqlitePool, ExceptionId) {
    let pool = db::connect_in_memory().await.unwrap();
    let id = lifecycle::submit(&pool, &new_exception(), "ccspadm")
        .await
        .unwrap();
    (pool, id)
}

async fn ledger_len(pool: &SqlitePool, id: ExceptionId) -> i64 {
    status_changes::count_for(pool, id).await.unwrap()
}

// -- Submission ---------------------------------------------------------------

#[tokio::test]
async fn test_submit_leaves_exception_undecided() {
    let (pool, id) = submitted().await;
    assert_eq!(
        lifecycle::get_status(&pool, id).await.unwrap(),
        ExceptionStatus::Undecided
    );
    assert_eq!(ledger_len(&pool, id).await, 1);
}

#[tokio::test]
async fn test_submitted_ids_increase() {
    let (pool, first) = submitted().await;
    let second = lifecycle::submit(&pool, &new_exception(), "ccspadm")
        .await
        .unwrap();
    assert!(second > first);
}

// -- Policy enforcement -------------------------------------------------------

#[tokio::test]
async fn test_approve_removed_requires_force() {
    let (pool, id) = submitted().await;
    lifecycle::approve(&pool, id, "a", false).await.unwrap();
    lifecycle::implement(&pool, id, "a", false).await.unwrap();
    lifecycle::remove(&pool, id, "a", false).await.unwrap();
    let before = ledger_len(&pool, id).await;

    let err = lifecycle::approve(&pool, id, "a", false).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition(_)));
    assert!(err.to_string().contains("removed -> approved"));
    assert_eq!(ledger_len(&pool, id).await, before);
    assert_eq!(
        lifecycle::get_status(&pool, id).await.unwrap(),
        ExceptionStatus::Removed
    );

    lifecycle::approve(&pool, id, "a", true).await.unwrap();
    let changes = status_changes::for_exception(&pool, id).await.unwrap();
    assert_eq!(changes.len() as i64, before + 1);
    let last = changes.last().unwrap();
    assert_eq!(last.old_status, ExceptionStatus::Removed);
    assert_eq!(last.new_status, ExceptionStatus::Approved);
    assert_eq!(
        lifecycle::get_status(&pool, id).await.unwrap(),
        ExceptionStatus::Approved
    );
}

#[tokio::test]
async fn test_reject_is_terminal() {
    let (pool, id) = submitted().await;
    lifecycle::reject(&pool, id, "a", false).await.unwrap();
    for target in ExceptionStatus::ALL {
        let result = lifecycle::change_status(&pool, id, target, "a", false).await;
        assert!(matches!(result, Err(StoreError::InvalidTransition(_))));
    }
}

#[tokio::test]
async fn test_undecide_is_only_valid_from_nothing() {
    let (pool, id) = submitted().await;
    let err = lifecycle::undecide(&pool, id, "a", false).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition(_)));
    lifecycle::undecide(&pool, id, "a", true).await.unwrap();
    assert_eq!(ledger_len(&pool, id).await, 2);
}

// -- Cache and ledger agreement -----------------------------------------------

#[tokio::test]
async fn test_reconstruction_matches_cache_after_each_step() {
    let (pool, id) = submitted().await;
    let steps = [
        ExceptionStatus::Approved,
        ExceptionStatus::Implemented,
        ExceptionStatus::Removed,
    ];
    for (n, step) in steps.into_iter().enumerate() {
        lifecycle::change_status(&pool, id, step, "a", false)
            .await
            .unwrap();
        assert_eq!(ledger_len(&pool, id).await, n as i64 + 2);
        assert_eq!(
            lifecycle::get_status(&pool, id).await.unwrap(),
            lifecycle::reconstruct_status(&pool, id).await.unwrap()
        );
    }
}

#[tokio::test]
async fn test_reconstruction_is_idempotent() {
    let (pool, id) = submitted().await;
    lifecycle::approve(&pool, id, "a", false).await.unwrap();
    let first = lifecycle::reconstruct_status(&pool, id).await.unwrap();
    let second = lifecycle::reconstruct_status(&pool, id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, ExceptionStatus::Approved);
}

#[tokio::test]
async fn test_verify_is_clean_after_normal_use() {
    let (pool, id) = submitted().await;
    lifecycle::approve(&pool, id, "a", false).await.unwrap();
    lifecycle::submit(&pool, &new_exception(), "a").await.unwrap();
    assert!(lifecycle::verify(&pool, None).await.unwrap().is_empty());
    assert!(lifecycle::verify(&pool, Some(id)).await.unwrap().is_empty());
}

// -- Soft deletion ------------------------------------------------------------

#[tokio::test]
async fn test_deleted_exception_is_not_found() {
    let (pool, id) = submitted().await;
    lifecycle::delete(&pool, id, "a").await.unwrap();

    for result in [
        lifecycle::get_status(&pool, id).await,
        lifecycle::reconstruct_status(&pool, id).await,
    ] {
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
    assert!(matches!(
        lifecycle::details(&pool, id).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(lifecycle::verify(&pool, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_details_collects_the_ledger() {
    let (pool, id) = submitted().await;
    lifecycle::approve(&pool, id, "ccspadm", false).await.unwrap();
    let details = lifecycle::details(&pool, id).await.unwrap();
    assert_eq!(details.exception.id, id);
    assert_eq!(details.exception.username, "ccspapp");
    assert_eq!(details.status_changes.len(), 2);
    assert_eq!(details.status_changes[1].changer, "ccspadm");
    assert!(details.files.is_empty());
    assert!(details.comments.is_empty());
}

// -- Property: forced and unforced transitions ---------------------------------

fn any_status() -> impl Strategy<Value = ExceptionStatus> {
    prop::sample::select(ExceptionStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_unforced_changes_follow_the_policy(
        current in any_status(),
        proposed in any_status(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let (pool, id) = submitted().await;
            lifecycle::change_status(&pool, id, current, "setup", true)
                .await
                .unwrap();
            let before = ledger_len(&pool, id).await;

            let result = lifecycle::change_status(&pool, id, proposed, "a", false).await;
            if is_valid_transition(current, proposed) {
                assert!(result.is_ok());
                assert_eq!(ledger_len(&pool, id).await, before + 1);
                assert_eq!(lifecycle::get_status(&pool, id).await.unwrap(), proposed);
            } else {
                assert!(matches!(result, Err(StoreError::InvalidTransition(_))));
                assert_eq!(ledger_len(&pool, id).await, before);
                assert_eq!(lifecycle::get_status(&pool, id).await.unwrap(), current);
            }
            assert_eq!(
                lifecycle::get_status(&pool, id).await.unwrap(),
                lifecycle::reconstruct_status(&pool, id).await.unwrap()
            );
        });
    }

    #[test]
    fn prop_forced_changes_always_apply(
        current in any_status(),
        proposed in any_status(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let (pool, id) = submitted().await;
            lifecycle::change_status(&pool, id, current, "setup", true)
                .await
                .unwrap();
            let before = ledger_len(&pool, id).await;

            lifecycle::change_status(&pool, id, proposed, "a", true)
                .await
                .unwrap();
            assert_eq!(ledger_len(&pool, id).await, before + 1);
            assert_eq!(
                lifecycle::reconstruct_status(&pool, id).await.unwrap(),
                proposed
            );
            assert!(lifecycle::verify(&pool, Some(id)).await.unwrap().is_empty());
        });
    }
}
