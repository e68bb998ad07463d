use std::sync::Arc;

use faltasi_core::db::{self, DbPool, DbTransactionExecutor};
use faltasi_core::errors::Error;
use faltasi_core::offerings::{NewOffering, Offering, OfferingRepository};
use faltasi_core::payments::{NewPayment, Payment, PaymentDirection, PaymentRepository};
use faltasi_core::transactions::{
    Transaction, TransactionDB, TransactionRepository, TransactionSide, TransactionStatus,
};
use faltasi_core::users::{NewUser, User, UserRepository, UserRole};

/// Creates a pooled connection to a fresh migrated database. The TempDir
/// must stay alive for as long as the pool is used.
pub fn test_pool() -> (tempfile::TempDir, Arc<DbPool>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("faltasi-test.db");
    let pool = db::create_pool(db_path.to_str().expect("Temp path is not valid UTF-8"))
        .expect("Failed to create pool");
    db::run_migrations(&pool).expect("Failed to run migrations");
    (dir, pool)
}

pub fn seed_user(pool: &Arc<DbPool>, phone: &str) -> User {
    UserRepository::new(pool.clone())
        .create(NewUser {
            name: format!("Investor {}", phone),
            phone: phone.to_string(),
            password_hash: "test-hash".to_string(),
            role: UserRole::Investor,
        })
        .expect("Failed to create user")
}

pub fn seed_offering(pool: &Arc<DbPool>, total_shares: i64, price_per_share: f64) -> Offering {
    OfferingRepository::new(pool.clone())
        .create(NewOffering {
            company_name: "Kilima Estates Ltd".to_string(),
            total_shares,
            price_per_share,
        })
        .expect("Failed to create offering")
}

/// Inserts the pending transaction and payment rows an order submission
/// would leave behind, without going through the gateway.
pub fn seed_pending_order(
    pool: &Arc<DbPool>,
    user_id: &str,
    offering_id: &str,
    side: TransactionSide,
    shares_count: i64,
    price: f64,
) -> (Transaction, Payment) {
    let transaction_repository = TransactionRepository::new(pool.clone());
    let payment_repository = PaymentRepository::new(pool.clone());

    let now = chrono::Utc::now().naive_utc();
    let transaction_db = TransactionDB {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        offering_id: offering_id.to_string(),
        side: side.as_str().to_string(),
        shares_count,
        price,
        status: TransactionStatus::Pending.as_str().to_string(),
        notes: None,
        created_at: now,
        updated_at: now,
    };
    let direction = match side {
        TransactionSide::Buy => PaymentDirection::In,
        TransactionSide::Sell => PaymentDirection::Out,
    };

    pool.execute(
        |conn| -> std::result::Result<(Transaction, Payment), Error> {
            let transaction =
                transaction_repository.create_in_transaction(conn, &transaction_db)?;
            let payment = payment_repository.create_in_transaction(
                conn,
                NewPayment {
                    user_id: user_id.to_string(),
                    transaction_id: transaction.id.clone(),
                    amount: shares_count as f64 * price,
                    direction,
                    method: Some("mpesa".to_string()),
                },
            )?;
            Ok((transaction, payment))
        },
    )
    .expect("Failed to seed pending order")
}
