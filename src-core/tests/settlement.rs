mod common;

use faltasi_core::db::DbTransactionExecutor;
use faltasi_core::errors::Error;
use faltasi_core::holdings::{HoldingError, HoldingRepository};
use faltasi_core::offerings::OfferingRepository;
use faltasi_core::transactions::{
    settle, SettlementOutcome, TransactionError, TransactionRepository, TransactionSide,
    TransactionStatus,
};

use common::{seed_offering, seed_pending_order, seed_user, test_pool};

#[test]
fn buy_then_buy_then_sell_walks_shares_through_the_book() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255700000001");
    let offering = seed_offering(&pool, 100, 10.0);

    let holding_repository = HoldingRepository::new(pool.clone());
    let offering_repository = OfferingRepository::new(pool.clone());

    let (first_buy, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 40, 10.0);
    let outcome = pool
        .execute(|conn| settle(conn, &first_buy.id))
        .expect("First buy should settle");
    assert!(matches!(outcome, SettlementOutcome::Settled(_)));

    let holding = holding_repository
        .get_by_user_and_offering(&user.id, &offering.id)
        .expect("Holding should exist after the first buy");
    assert_eq!(holding.shares_owned, 40);
    assert_eq!(holding.average_price, 10.0);
    assert_eq!(
        offering_repository.get_by_id(&offering.id).unwrap().available_shares,
        60
    );

    // Second lot at a higher price shifts the average to 12
    let (second_buy, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 10, 20.0);
    pool.execute(|conn| settle(conn, &second_buy.id))
        .expect("Second buy should settle");

    let holding = holding_repository
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap();
    assert_eq!(holding.shares_owned, 50);
    assert_eq!(holding.average_price, 12.0);
    assert_eq!(
        offering_repository.get_by_id(&offering.id).unwrap().available_shares,
        50
    );

    // Selling the whole position deletes the holding and restores supply
    let (sell, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Sell, 50, 12.0);
    pool.execute(|conn| settle(conn, &sell.id))
        .expect("Sell should settle");

    let err = holding_repository
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap_err();
    assert!(matches!(err, HoldingError::NotFound(_)));
    assert_eq!(
        offering_repository.get_by_id(&offering.id).unwrap().available_shares,
        100
    );
}

#[test]
fn settling_twice_is_a_no_op() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255700000002");
    let offering = seed_offering(&pool, 100, 10.0);

    let (buy, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 30, 10.0);
    pool.execute(|conn| settle(conn, &buy.id))
        .expect("First settle should apply");

    let outcome = pool
        .execute(|conn| settle(conn, &buy.id))
        .expect("Second settle should not error");
    assert!(matches!(outcome, SettlementOutcome::AlreadySettled));

    let holding = HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap();
    assert_eq!(holding.shares_owned, 30);
    assert_eq!(
        OfferingRepository::new(pool.clone())
            .get_by_id(&offering.id)
            .unwrap()
            .available_shares,
        70
    );
}

#[test]
fn oversized_buy_rolls_back_and_stays_pending() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255700000003");
    let offering = seed_offering(&pool, 10, 5.0);

    let (buy, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 20, 5.0);
    let err = pool.execute(|conn| settle(conn, &buy.id)).unwrap_err();
    assert!(matches!(
        err,
        Error::Transaction(TransactionError::InsufficientSupply {
            available: 10,
            requested: 20,
        })
    ));

    // The rollback undoes the claim, so the order can be retried
    let transaction = TransactionRepository::new(pool.clone())
        .get_by_id(&buy.id)
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(
        OfferingRepository::new(pool.clone())
            .get_by_id(&offering.id)
            .unwrap()
            .available_shares,
        10
    );
    assert!(HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .is_err());
}

#[test]
fn selling_more_than_owned_is_rejected() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255700000004");
    let offering = seed_offering(&pool, 100, 10.0);

    let (buy, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Buy, 5, 10.0);
    pool.execute(|conn| settle(conn, &buy.id)).unwrap();

    let (sell, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Sell, 8, 10.0);
    let err = pool.execute(|conn| settle(conn, &sell.id)).unwrap_err();
    assert!(matches!(
        err,
        Error::Transaction(TransactionError::InsufficientHoldings {
            owned: 5,
            requested: 8,
        })
    ));

    let holding = HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap();
    assert_eq!(holding.shares_owned, 5);
    assert_eq!(
        TransactionRepository::new(pool.clone())
            .get_by_id(&sell.id)
            .unwrap()
            .status,
        TransactionStatus::Pending
    );
}

#[test]
fn shares_are_conserved_across_settlements() {
    let (_dir, pool) = test_pool();
    let alice = seed_user(&pool, "+255700000005");
    let bob = seed_user(&pool, "+255700000006");
    let offering = seed_offering(&pool, 1000, 2.5);

    for (user_id, side, shares) in [
        (&alice.id, TransactionSide::Buy, 300),
        (&bob.id, TransactionSide::Buy, 150),
        (&alice.id, TransactionSide::Sell, 100),
        (&bob.id, TransactionSide::Buy, 50),
    ] {
        let (order, _) = seed_pending_order(&pool, user_id, &offering.id, side, shares, 2.5);
        pool.execute(|conn| settle(conn, &order.id)).unwrap();
    }

    let available = OfferingRepository::new(pool.clone())
        .get_by_id(&offering.id)
        .unwrap()
        .available_shares;
    let held: i64 = HoldingRepository::new(pool.clone())
        .list_for_offering(&offering.id)
        .unwrap()
        .iter()
        .map(|h| h.shares_owned)
        .sum();
    assert_eq!(available + held, 1000);
}
