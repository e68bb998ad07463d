mod common;

use faltasi_core::db::DbTransactionExecutor;
use faltasi_core::dividends::{DividendError, DividendService, NewDividend, PayoutStatus};
use faltasi_core::transactions::{settle, TransactionSide};

use common::{seed_offering, seed_pending_order, seed_user, test_pool};

fn settle_buy(
    pool: &std::sync::Arc<faltasi_core::db::DbPool>,
    user_id: &str,
    offering_id: &str,
    shares: i64,
    price: f64,
) {
    let (order, _) = seed_pending_order(pool, user_id, offering_id, TransactionSide::Buy, shares, price);
    pool.execute(|conn| settle(conn, &order.id))
        .expect("Order should settle");
}

#[test]
fn declaration_creates_one_payout_per_holder() {
    let (_dir, pool) = test_pool();
    let alice = seed_user(&pool, "+255720000001");
    let bob = seed_user(&pool, "+255720000002");
    let offering = seed_offering(&pool, 100, 10.0);
    settle_buy(&pool, &alice.id, &offering.id, 40, 10.0);
    settle_buy(&pool, &bob.id, &offering.id, 10, 10.0);

    let service = DividendService::new(pool.clone());
    let dividend = service
        .declare_dividend(NewDividend {
            offering_id: offering.id.clone(),
            amount_per_share: 2.0,
        })
        .expect("Declaration should succeed");

    let payouts = service.list_payouts(&dividend.id).unwrap();
    assert_eq!(payouts.len(), 2);

    let for_alice = payouts.iter().find(|p| p.user_id == alice.id).unwrap();
    assert_eq!(for_alice.shares_at_declaration, 40);
    assert_eq!(for_alice.amount, 80.0);
    assert_eq!(for_alice.status, PayoutStatus::Pending);

    let for_bob = payouts.iter().find(|p| p.user_id == bob.id).unwrap();
    assert_eq!(for_bob.shares_at_declaration, 10);
    assert_eq!(for_bob.amount, 20.0);
}

#[test]
fn payout_is_fixed_at_declaration_time() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255720000003");
    let offering = seed_offering(&pool, 100, 10.0);
    settle_buy(&pool, &user.id, &offering.id, 30, 10.0);

    let service = DividendService::new(pool.clone());
    let dividend = service
        .declare_dividend(NewDividend {
            offering_id: offering.id.clone(),
            amount_per_share: 1.5,
        })
        .unwrap();

    // Selling the whole position afterwards does not touch the payout
    let (sell, _) =
        seed_pending_order(&pool, &user.id, &offering.id, TransactionSide::Sell, 30, 10.0);
    pool.execute(|conn| settle(conn, &sell.id)).unwrap();

    let payouts = service.list_payouts(&dividend.id).unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].shares_at_declaration, 30);
    assert_eq!(payouts[0].amount, 45.0);
}

#[test]
fn paying_a_payout_twice_is_rejected() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255720000004");
    let offering = seed_offering(&pool, 100, 10.0);
    settle_buy(&pool, &user.id, &offering.id, 20, 10.0);

    let service = DividendService::new(pool.clone());
    let dividend = service
        .declare_dividend(NewDividend {
            offering_id: offering.id.clone(),
            amount_per_share: 1.0,
        })
        .unwrap();
    let payout_id = service.list_payouts(&dividend.id).unwrap()[0].id.clone();

    let paid = service.pay_payout(&payout_id).expect("First pay should succeed");
    assert_eq!(paid.status, PayoutStatus::Paid);
    assert!(paid.paid_at.is_some());

    let err = service.pay_payout(&payout_id).unwrap_err();
    assert!(matches!(err, DividendError::AlreadyPaid(_)));
}

#[test]
fn declaring_on_a_missing_offering_fails() {
    let (_dir, pool) = test_pool();
    let service = DividendService::new(pool.clone());

    let err = service
        .declare_dividend(NewDividend {
            offering_id: "no-such-offering".to_string(),
            amount_per_share: 1.0,
        })
        .unwrap_err();
    assert!(matches!(err, DividendError::NotFound(_)));
}

#[test]
fn declaration_with_no_holders_creates_no_payouts() {
    let (_dir, pool) = test_pool();
    let offering = seed_offering(&pool, 100, 10.0);

    let service = DividendService::new(pool.clone());
    let dividend = service
        .declare_dividend(NewDividend {
            offering_id: offering.id.clone(),
            amount_per_share: 1.0,
        })
        .unwrap();

    assert!(service.list_payouts(&dividend.id).unwrap().is_empty());
}

#[test]
fn deleting_a_dividend_removes_its_payouts() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255720000005");
    let offering = seed_offering(&pool, 100, 10.0);
    settle_buy(&pool, &user.id, &offering.id, 10, 10.0);

    let service = DividendService::new(pool.clone());
    let dividend = service
        .declare_dividend(NewDividend {
            offering_id: offering.id.clone(),
            amount_per_share: 1.0,
        })
        .unwrap();
    assert_eq!(service.list_user_payouts(&user.id).unwrap().len(), 1);

    service.delete_dividend(&dividend.id).unwrap();

    let err = service.get_dividend(&dividend.id).unwrap_err();
    assert!(matches!(err, DividendError::NotFound(_)));
    assert!(service.list_user_payouts(&user.id).unwrap().is_empty());
}
