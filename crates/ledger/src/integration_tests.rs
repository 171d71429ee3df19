//! Integration tests for the full command → journal → feed pipeline.
//!
//! Verifies:
//! - Commands validate against the registry/catalog before mutating
//! - The journal records every commit in order and replays faithfully
//! - Racing mutations on one entity serialize with whole-transaction
//!   semantics

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::event::LedgerEvent;
use crate::ledger::Ledger;
use supplytrace_core::{BatchId, LedgerError, ProductId, WalletAddress};
use supplytrace_identity::{IdentityEvent, Role, UserStatus};
use supplytrace_products::{Stage, StagePolicy};

fn wallet(n: u8) -> WalletAddress {
    format!("0x{:040x}", n).parse().unwrap()
}

fn admin() -> WalletAddress {
    wallet(0xad)
}

/// Fresh ledger with tracing initialized, so test runs honor `RUST_LOG`.
fn setup() -> Ledger {
    supplytrace_observability::init();
    Ledger::new(admin())
}

/// Registers one Active participant per role, wallets 1 through 5.
fn seed_participants(ledger: &Ledger) {
    let participants = [
        (1u8, "Alice Gardens", Role::Manufacturer),
        (2, "Depot North", Role::Warehouse),
        (3, "Hill Haulage", Role::Transporter),
        (4, "Valley Wholesale", Role::Distributor),
        (5, "Corner Teashop", Role::Retailer),
    ];
    for (n, name, role) in participants {
        ledger
            .admin_add_user(&admin(), wallet(n), name, "Darjeeling", role)
            .unwrap();
    }
}

fn seed_product(ledger: &Ledger) -> ProductId {
    let now = Utc::now();
    ledger
        .create_batch(&wallet(1), "Spring Flush", "First pick of the season")
        .unwrap();
    ledger
        .add_product(
            &wallet(1),
            "Darjeeling First Flush",
            "Tea",
            "Loose leaf, 250g",
            BatchId::new(1),
            now - Duration::days(2),
            now + Duration::days(365),
            1_499,
        )
        .unwrap()
        .id
}

#[test]
fn registration_needs_approval_before_acting() {
    let ledger = setup();

    let user = ledger
        .register_user(&wallet(1), "Alice Gardens", "Darjeeling", Role::Manufacturer)
        .unwrap();
    assert_eq!(user.status, UserStatus::Pending);

    // Pending users cannot create batches.
    let err = ledger
        .create_batch(&wallet(1), "Spring Flush", "First pick")
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { .. }));

    let (old, new) = ledger
        .set_user_status(&admin(), &wallet(1), UserStatus::Active)
        .unwrap();
    assert_eq!((old, new), (UserStatus::Pending, UserStatus::Active));

    ledger
        .create_batch(&wallet(1), "Spring Flush", "First pick")
        .unwrap();
}

#[test]
fn privileged_operations_reject_non_admin_callers() {
    let ledger = setup();
    ledger
        .register_user(&wallet(1), "Alice Gardens", "Darjeeling", Role::Manufacturer)
        .unwrap();

    let err = ledger
        .admin_add_user(&wallet(1), wallet(2), "Depot North", "Kolkata", Role::Warehouse)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { .. }));

    let err = ledger
        .set_user_status(&wallet(1), &wallet(1), UserStatus::Active)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { .. }));

    // Nothing committed beyond the registration.
    assert_eq!(ledger.last_sequence(), 1);
}

#[test]
fn blocked_is_terminal_through_the_facade() {
    let ledger = setup();
    seed_participants(&ledger);

    ledger
        .set_user_status(&admin(), &wallet(1), UserStatus::Blocked)
        .unwrap();
    let err = ledger
        .set_user_status(&admin(), &wallet(1), UserStatus::Active)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));
    assert_eq!(
        ledger.get_user(&wallet(1)).unwrap().status,
        UserStatus::Blocked
    );
}

#[test]
fn add_product_requires_existing_batch() {
    let ledger = setup();
    seed_participants(&ledger);
    let now = Utc::now();

    let err = ledger
        .add_product(
            &wallet(1),
            "Tea",
            "Tea",
            "desc",
            BatchId::new(1),
            now - Duration::days(1),
            now + Duration::days(1),
            100,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "batch", .. }));
}

#[test]
fn create_then_details_round_trips_one_open_record() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);

    let details = ledger.get_details(product_id).unwrap();
    assert_eq!(details.product.stage, Stage::Manufactured);
    assert_eq!(details.batch.name, "Spring Flush");
    assert_eq!(details.history.len(), 1);
    assert_eq!(details.history[0].stage, Stage::Manufactured);
    assert!(details.history[0].is_open());

    // Reads are idempotent.
    assert_eq!(details, ledger.get_details(product_id).unwrap());
}

#[test]
fn product_ids_are_dense_and_monotonic() {
    let ledger = setup();
    seed_participants(&ledger);
    ledger
        .create_batch(&wallet(1), "Spring Flush", "First pick")
        .unwrap();

    let now = Utc::now();
    for expected in 1..=5u64 {
        let product = ledger
            .add_product(
                &wallet(1),
                "Tea",
                "Tea",
                "desc",
                BatchId::new(1),
                now - Duration::days(1),
                now + Duration::days(1),
                100,
            )
            .unwrap();
        assert_eq!(product.id.as_u64(), expected);
    }
}

#[test]
fn skipping_warehoused_fails_with_invalid_transition() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);

    // Transporter has the right role for Dispatched, but Warehoused was
    // skipped.
    let err = ledger
        .advance_stage(&wallet(3), product_id, Stage::Dispatched, "on the truck")
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));
    assert_eq!(
        ledger.get_details(product_id).unwrap().product.stage,
        Stage::Manufactured
    );
}

#[test]
fn wrong_role_for_stage_is_unauthorized() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);

    // The manufacturer may not record warehouse custody.
    let err = ledger
        .advance_stage(&wallet(1), product_id, Stage::Warehoused, "took it back")
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { .. }));
}

fn walk_to_sold(ledger: &Ledger, product_id: ProductId) {
    let legs = [
        (2u8, Stage::Warehoused, "received at depot"),
        (3, Stage::Dispatched, "loaded for delivery"),
        (4, Stage::Distributor, "arrived at wholesaler"),
        (5, Stage::Retailer, "on the shelf"),
        (5, Stage::Sold, "sold to customer"),
    ];
    for (n, stage, remark) in legs {
        ledger
            .advance_stage(&wallet(n), product_id, stage, remark)
            .unwrap();
    }
}

#[test]
fn full_lifecycle_reaches_sold_with_audit_trail() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);
    walk_to_sold(&ledger, product_id);

    let details = ledger.get_details(product_id).unwrap();
    assert_eq!(details.product.stage, Stage::Sold);
    assert_eq!(details.history.len(), 6);
    assert!(details.history[..5].iter().all(|r| !r.is_open()));
    assert!(details.history[5].is_open());

    // Every handler appears in the trail with the role they held.
    assert_eq!(details.history[1].handler, wallet(2));
    assert_eq!(details.history[1].handler_role, Role::Warehouse);
    assert_eq!(details.history[5].handler, wallet(5));
    assert_eq!(details.history[5].handler_role, Role::Retailer);
}

#[test]
fn sold_product_rejects_mark_lost_as_terminal() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);
    walk_to_sold(&ledger, product_id);

    let err = ledger
        .mark_lost(&wallet(5), product_id, "cannot find it")
        .unwrap_err();
    assert!(matches!(err, LedgerError::TerminalState { .. }));
}

#[test]
fn any_active_role_may_report_a_loss() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);

    ledger
        .advance_stage(&wallet(2), product_id, Stage::Warehoused, "received")
        .unwrap();
    // The manufacturer reports the loss even though warehouse has custody.
    let product = ledger
        .mark_lost(&wallet(1), product_id, "shipment destroyed")
        .unwrap();
    assert_eq!(product.stage, Stage::Lost);
}

#[test]
fn list_by_handler_reflects_custody_records() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);
    ledger
        .advance_stage(&wallet(2), product_id, Stage::Warehoused, "received")
        .unwrap();

    assert_eq!(ledger.list_by_handler(&wallet(1)).len(), 1);
    assert_eq!(ledger.list_by_handler(&wallet(2)).len(), 1);
    assert!(ledger.list_by_handler(&wallet(5)).is_empty());
}

#[test]
fn batch_queries_reflect_the_catalog() {
    let ledger = setup();
    assert_eq!(ledger.admin(), &admin());
    seed_participants(&ledger);

    let batch = ledger
        .create_batch(&wallet(1), "Spring Flush", "First pick")
        .unwrap();
    assert_eq!(ledger.get_batch(batch.id).unwrap(), batch);
    assert_eq!(ledger.list_batches(), vec![batch]);

    let err = ledger.get_batch(BatchId::new(9)).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "batch", .. }));
}

#[test]
fn custom_policy_replaces_the_default_mapping() {
    supplytrace_observability::init();
    let mut policy = StagePolicy::default();
    policy.set_rule(Stage::Warehoused, None);
    let ledger = Ledger::with_policy(admin(), policy);
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);

    // Under the custom rule the manufacturer may record warehouse entry.
    let product = ledger
        .advance_stage(&wallet(1), product_id, Stage::Warehoused, "stored on site")
        .unwrap();
    assert_eq!(product.stage, Stage::Warehoused);
}

#[test]
fn journal_records_every_commit_in_order() {
    let ledger = setup();
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);
    ledger
        .advance_stage(&wallet(2), product_id, Stage::Warehoused, "received")
        .unwrap();

    let records = ledger.replay_from(1);
    let kinds: Vec<_> = records.iter().map(|r| r.kind().to_string()).collect();
    assert_eq!(
        kinds,
        vec![
            "identity.user.added",
            "identity.user.added",
            "identity.user.added",
            "identity.user.added",
            "identity.user.added",
            "catalog.batch.created",
            "products.product.added",
            "products.product.stage_updated",
        ]
    );

    // Dense sequence numbers from 1.
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.sequence_number(), i as u64 + 1);
    }

    // Mid-stream replay returns the exact suffix.
    let tail = ledger.replay_from(7);
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].kind(), "products.product.added");

    // Replay is stable between mutations.
    assert_eq!(ledger.replay_from(1), ledger.replay_from(1));
}

#[test]
fn status_update_event_carries_old_and_new() {
    let ledger = setup();
    ledger
        .register_user(&wallet(1), "Alice Gardens", "Darjeeling", Role::Manufacturer)
        .unwrap();
    ledger
        .set_user_status(&admin(), &wallet(1), UserStatus::Active)
        .unwrap();

    let records = ledger.replay_from(2);
    let LedgerEvent::Identity(IdentityEvent::UserStatusUpdated(e)) = records[0].payload() else {
        panic!("expected UserStatusUpdated payload");
    };
    assert_eq!(e.wallet, wallet(1));
    assert_eq!(e.old_status, UserStatus::Pending);
    assert_eq!(e.new_status, UserStatus::Active);
}

#[test]
fn subscriber_sees_committed_records_in_order() {
    let ledger = setup();
    let feed = ledger.subscribe();

    seed_participants(&ledger);
    let product_id = seed_product(&ledger);
    ledger
        .advance_stage(&wallet(2), product_id, Stage::Warehoused, "received")
        .unwrap();

    for expected in 1..=8u64 {
        let record = feed
            .recv_timeout(std::time::Duration::from_secs(1))
            .unwrap();
        assert_eq!(record.sequence_number(), expected);
    }
    assert!(feed.try_recv().is_err());
}

#[test]
fn failed_commands_publish_nothing() {
    let ledger = setup();
    let feed = ledger.subscribe();

    // Short name: rejected before any mutation.
    let err = ledger
        .register_user(&wallet(1), "Ali", "Darjeeling", Role::Manufacturer)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation { .. }));

    assert_eq!(ledger.last_sequence(), 0);
    assert!(feed.try_recv().is_err());
    assert!(ledger.list_users().is_empty());
}

#[test]
fn racing_advances_on_one_product_serialize() {
    let ledger = Arc::new(setup());
    seed_participants(&ledger);
    let product_id = seed_product(&ledger);

    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
    let mut handles = Vec::new();
    for _ in 0..2 {
        let ledger = Arc::clone(&ledger);
        let ready = ready_tx.clone();
        handles.push(std::thread::spawn(move || {
            let _ = ready.send(());
            ledger.advance_stage(&wallet(2), product_id, Stage::Warehoused, "received")
        }));
    }
    drop(ready_tx);
    // Both threads spawned before we join.
    for _ in 0..2 {
        let _ = ready_rx.recv();
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let oks = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(oks, 1);

    // The loser re-evaluated against the winner's post-state.
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        LedgerError::InvalidTransition { .. }
    ));

    let details = ledger.get_details(product_id).unwrap();
    assert_eq!(details.product.stage, Stage::Warehoused);
    assert_eq!(details.history.len(), 2);
}

#[test]
fn concurrent_product_creation_keeps_ids_dense() {
    let ledger = Arc::new(setup());
    seed_participants(&ledger);
    ledger
        .create_batch(&wallet(1), "Spring Flush", "First pick")
        .unwrap();

    let now = Utc::now();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let ledger = Arc::clone(&ledger);
        handles.push(std::thread::spawn(move || {
            let mut ids = Vec::new();
            for _ in 0..5 {
                let product = ledger
                    .add_product(
                        &wallet(1),
                        "Tea",
                        "Tea",
                        "desc",
                        BatchId::new(1),
                        now - Duration::days(1),
                        now + Duration::days(1),
                        100,
                    )
                    .unwrap();
                ids.push(product.id.as_u64());
            }
            ids
        }));
    }

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (1..=20).collect::<Vec<u64>>());
}
