mod common;

use std::sync::Arc;

use faltasi_core::cache::MemoryCache;
use faltasi_core::db::DbTransactionExecutor;
use faltasi_core::holdings::HoldingRepository;
use faltasi_core::payments::{
    CallbackOutcome, CallbackPayload, PaymentRepository, PaymentService, PaymentStatus,
};
use faltasi_core::transactions::{
    TransactionRepository, TransactionSide, TransactionStatus,
};

use common::{seed_offering, seed_pending_order, seed_user, test_pool};

fn payment_service(pool: &Arc<faltasi_core::db::DbPool>) -> PaymentService {
    PaymentService::new(pool.clone(), Arc::new(MemoryCache::new()))
}

#[test]
fn completed_callback_settles_the_order() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255710000001");
    let offering = seed_offering(&pool, 100, 10.0);
    let (order, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 25, 10.0);

    let outcome = payment_service(&pool)
        .handle_callback(&CallbackPayload {
            transaction_id: Some(order.id.clone()),
            external_id: None,
            status: "SUCCESS".to_string(),
            amount: Some(250.0),
        })
        .expect("Callback should be processed");
    assert_eq!(outcome, CallbackOutcome::Settled);

    let transaction = TransactionRepository::new(pool.clone())
        .get_by_id(&order.id)
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Approved);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&order.id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);

    let holding = HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap();
    assert_eq!(holding.shares_owned, 25);
}

#[test]
fn repeated_callback_is_a_duplicate() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255710000002");
    let offering = seed_offering(&pool, 100, 10.0);
    let (order, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 25, 10.0);

    let service = payment_service(&pool);
    let payload = CallbackPayload {
        transaction_id: Some(order.id.clone()),
        external_id: None,
        status: "completed".to_string(),
        amount: None,
    };

    assert_eq!(
        service.handle_callback(&payload).unwrap(),
        CallbackOutcome::Settled
    );
    assert_eq!(
        service.handle_callback(&payload).unwrap(),
        CallbackOutcome::Duplicate
    );

    // The position did not double up
    let holding = HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap();
    assert_eq!(holding.shares_owned, 25);
}

#[test]
fn failed_callback_closes_the_order_without_settling() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255710000003");
    let offering = seed_offering(&pool, 100, 10.0);
    let (order, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 25, 10.0);

    let outcome = payment_service(&pool)
        .handle_callback(&CallbackPayload {
            transaction_id: Some(order.id.clone()),
            external_id: None,
            status: "failed".to_string(),
            amount: None,
        })
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Failed);

    let transaction = TransactionRepository::new(pool.clone())
        .get_by_id(&order.id)
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Failed);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&order.id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);

    assert!(HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .is_err());
}

#[test]
fn callback_matches_by_external_id() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255710000004");
    let offering = seed_offering(&pool, 100, 10.0);
    let (order, payment) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 10, 10.0);

    PaymentRepository::new(pool.clone())
        .set_external_id(&payment.id, "WPG-12345")
        .unwrap();

    let outcome = payment_service(&pool)
        .handle_callback(&CallbackPayload {
            transaction_id: None,
            external_id: Some("WPG-12345".to_string()),
            status: "paid".to_string(),
            amount: None,
        })
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Settled);

    assert_eq!(
        TransactionRepository::new(pool.clone())
            .get_by_id(&order.id)
            .unwrap()
            .status,
        TransactionStatus::Approved
    );
}

#[test]
fn unmatched_callback_is_acknowledged_without_changes() {
    let (_dir, pool) = test_pool();

    let outcome = payment_service(&pool)
        .handle_callback(&CallbackPayload {
            transaction_id: Some("no-such-transaction".to_string()),
            external_id: Some("no-such-external-id".to_string()),
            status: "completed".to_string(),
            amount: None,
        })
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Unmatched);
}

#[test]
fn non_terminal_status_is_ignored() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255710000005");
    let offering = seed_offering(&pool, 100, 10.0);
    let (order, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 10, 10.0);

    let outcome = payment_service(&pool)
        .handle_callback(&CallbackPayload {
            transaction_id: Some(order.id.clone()),
            external_id: None,
            status: "processing".to_string(),
            amount: None,
        })
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Ignored);

    assert_eq!(
        TransactionRepository::new(pool.clone())
            .get_by_id(&order.id)
            .unwrap()
            .status,
        TransactionStatus::Pending
    );
}

#[test]
fn completed_callback_after_rejection_is_a_duplicate() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255710000006");
    let offering = seed_offering(&pool, 100, 10.0);
    let (order, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 10, 10.0);

    let transaction_repository = TransactionRepository::new(pool.clone());
    let now = chrono::Utc::now().naive_utc();
    let claimed = pool
        .execute(|conn| {
            transaction_repository.close_pending_in_transaction(
                conn,
                &order.id,
                TransactionStatus::Rejected,
                now,
            )
        })
        .unwrap();
    assert_eq!(claimed, 1);

    let outcome = payment_service(&pool)
        .handle_callback(&CallbackPayload {
            transaction_id: Some(order.id.clone()),
            external_id: None,
            status: "completed".to_string(),
            amount: None,
        })
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Duplicate);

    // A rejected order never reaches the holdings table
    assert!(HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .is_err());
    assert_eq!(
        transaction_repository.get_by_id(&order.id).unwrap().status,
        TransactionStatus::Rejected
    );
}
