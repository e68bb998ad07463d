mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use faltasi_core::cache::MemoryCache;
use faltasi_core::db::DbPool;
use faltasi_core::holdings::HoldingRepository;
use faltasi_core::payments::{
    GatewayReceipt, PaymentError, PaymentGateway, PaymentRepository, PaymentStatus,
};
use faltasi_core::transactions::{
    NewTransaction, TransactionError, TransactionRepository, TransactionService,
    TransactionServiceTrait, TransactionSide, TransactionStatus,
};

use common::{seed_offering, seed_user, test_pool};

/// Gateway double that answers every request the same way.
enum GatewayMode {
    Accept(Option<String>),
    Decline,
    Unreachable,
}

struct ScriptedGateway {
    mode: GatewayMode,
}

impl ScriptedGateway {
    fn respond(&self) -> Result<GatewayReceipt, PaymentError> {
        match &self.mode {
            GatewayMode::Accept(external_id) => Ok(GatewayReceipt {
                external_id: external_id.clone(),
                status: PaymentStatus::Pending,
            }),
            GatewayMode::Decline => Ok(GatewayReceipt {
                external_id: None,
                status: PaymentStatus::Failed,
            }),
            GatewayMode::Unreachable => Err(PaymentError::GatewayUnreachable(
                "connection refused".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn checkout(&self, _: &str, _: f64, _: &str) -> Result<GatewayReceipt, PaymentError> {
        self.respond()
    }

    async fn disburse(&self, _: &str, _: f64, _: &str) -> Result<GatewayReceipt, PaymentError> {
        self.respond()
    }
}

fn order_service(pool: &Arc<DbPool>, mode: GatewayMode) -> TransactionService {
    TransactionService::new(
        pool.clone(),
        Arc::new(ScriptedGateway { mode }),
        Arc::new(MemoryCache::new()),
        Duration::from_secs(60),
    )
}

fn buy_order(user_id: &str, offering_id: &str, shares_count: i64) -> NewTransaction {
    NewTransaction {
        user_id: user_id.to_string(),
        offering_id: offering_id.to_string(),
        side: TransactionSide::Buy,
        shares_count,
        notes: None,
    }
}

#[tokio::test]
async fn submission_records_both_pending_legs() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255740000001");
    let offering = seed_offering(&pool, 100, 10.0);

    let service = order_service(&pool, GatewayMode::Accept(Some("WPG-777".to_string())));
    let transaction = service
        .initiate_order(buy_order(&user.id, &offering.id, 20), Some("mpesa".to_string()))
        .await
        .expect("Order should be accepted");
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.price, 10.0);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&transaction.id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, 200.0);
    assert_eq!(payment.external_id.as_deref(), Some("WPG-777"));

    // Shares only move at settlement
    assert!(HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .is_err());
}

#[tokio::test]
async fn gateway_outage_leaves_the_order_pending() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255740000002");
    let offering = seed_offering(&pool, 100, 10.0);

    let service = order_service(&pool, GatewayMode::Unreachable);
    let err = service
        .initiate_order(buy_order(&user.id, &offering.id, 20), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::GatewayUnreachable(_)));

    // Both legs survive for a later callback or admin approval
    let transactions = TransactionRepository::new(pool.clone())
        .list_for_user(&user.id)
        .unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, TransactionStatus::Pending);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&transactions[0].id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn synchronous_decline_closes_the_order() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255740000003");
    let offering = seed_offering(&pool, 100, 10.0);

    let service = order_service(&pool, GatewayMode::Decline);
    let transaction = service
        .initiate_order(buy_order(&user.id, &offering.id, 20), None)
        .await
        .expect("A declined order is still returned");
    assert_eq!(transaction.status, TransactionStatus::Failed);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&transaction.id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .is_err());
}

#[tokio::test]
async fn approval_settles_and_completes_the_payment_leg() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255740000004");
    let offering = seed_offering(&pool, 100, 10.0);

    let service = order_service(&pool, GatewayMode::Accept(None));
    let submitted = service
        .initiate_order(buy_order(&user.id, &offering.id, 20), None)
        .await
        .unwrap();

    let approved = service
        .approve_transaction(&submitted.id)
        .expect("Approval should settle");
    assert_eq!(approved.status, TransactionStatus::Approved);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&submitted.id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);

    let holding = HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .unwrap();
    assert_eq!(holding.shares_owned, 20);

    // A second approval finds nothing left to claim
    let err = service.approve_transaction(&submitted.id).unwrap_err();
    assert!(matches!(err, TransactionError::AlreadyProcessed(_)));
}

#[tokio::test]
async fn rejection_closes_both_legs_without_settling() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255740000005");
    let offering = seed_offering(&pool, 100, 10.0);

    let service = order_service(&pool, GatewayMode::Accept(None));
    let submitted = service
        .initiate_order(buy_order(&user.id, &offering.id, 20), None)
        .await
        .unwrap();

    let rejected = service.reject_transaction(&submitted.id).unwrap();
    assert_eq!(rejected.status, TransactionStatus::Rejected);

    let payment = PaymentRepository::new(pool.clone())
        .get_by_transaction(&submitted.id)
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(HoldingRepository::new(pool.clone())
        .get_by_user_and_offering(&user.id, &offering.id)
        .is_err());

    let err = service.reject_transaction(&submitted.id).unwrap_err();
    assert!(matches!(err, TransactionError::AlreadyProcessed(_)));
}

#[tokio::test]
async fn deactivated_users_cannot_order() {
    let (_dir, pool) = test_pool();
    let user = seed_user(&pool, "+255740000006");
    let offering = seed_offering(&pool, 100, 10.0);

    faltasi_core::users::UserRepository::new(pool.clone())
        .set_active(&user.id, false)
        .unwrap();

    let service = order_service(&pool, GatewayMode::Accept(None));
    let err = service
        .initiate_order(buy_order(&user.id, &offering.id, 20), None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransactionError::InvalidData(_)));
    assert!(TransactionRepository::new(pool.clone())
        .list_for_user(&user.id)
        .unwrap()
        .is_empty());
}
