use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{debug, warn};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{keys, Cache};
use crate::db::{DbPool, DbTransactionExecutor};
use crate::errors::Error;
use crate::holdings::HoldingRepository;
use crate::offerings::{OfferingError, OfferingRepository};
use crate::payments::{
    NewPayment, Payment, PaymentDirection, PaymentGateway, PaymentRepository, PaymentStatus,
};
use crate::transactions::{Result, TransactionError};
use crate::users::{UserError, UserRepository};

use super::settlement::{settle, SettlementOutcome};
use super::transactions_model::{
    NewTransaction, Transaction, TransactionDB, TransactionSide, TransactionStatus,
};
use super::transactions_repository::TransactionRepository;
use super::transactions_traits::TransactionServiceTrait;

/// Service for the order lifecycle: submission, settlement on approval or
/// callback, rejection, and listings.
pub struct TransactionService {
    pool: Arc<DbPool>,
    repository: TransactionRepository,
    payment_repository: PaymentRepository,
    offering_repository: OfferingRepository,
    holding_repository: HoldingRepository,
    user_repository: UserRepository,
    gateway: Arc<dyn PaymentGateway>,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
}

impl TransactionService {
    /// Creates a new TransactionService instance
    pub fn new(
        pool: Arc<DbPool>,
        gateway: Arc<dyn PaymentGateway>,
        cache: Arc<dyn Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository: TransactionRepository::new(pool.clone()),
            payment_repository: PaymentRepository::new(pool.clone()),
            offering_repository: OfferingRepository::new(pool.clone()),
            holding_repository: HoldingRepository::new(pool.clone()),
            user_repository: UserRepository::new(pool.clone()),
            pool,
            gateway,
            cache,
            cache_ttl,
        }
    }

    fn invalidate_after_write(&self, user_id: &str, offering_id: &str) {
        self.cache.remove(&[
            &keys::user_transactions(user_id),
            &keys::user_portfolio(user_id),
            keys::OFFERINGS_ALL,
            &keys::offering_detail(offering_id),
        ]);
    }

    fn order_amount(shares_count: i64, price: f64) -> Result<f64> {
        let price_d = Decimal::from_f64_retain(price)
            .ok_or_else(|| TransactionError::InvalidData("Price is not a number".to_string()))?;
        (Decimal::from(shares_count) * price_d).to_f64().ok_or_else(|| {
            TransactionError::InvalidData("Order amount out of representable range".to_string())
        })
    }

    fn unwrap_root(err: Error) -> TransactionError {
        match err {
            Error::Transaction(e) => e,
            other => TransactionError::DatabaseError(other.to_string()),
        }
    }

    /// Terminal transition for a pending transaction that never settles.
    fn close_without_settlement(
        &self,
        transaction_id: &str,
        transaction_status: TransactionStatus,
        now: NaiveDateTime,
    ) -> Result<Transaction> {
        let transaction_id = transaction_id.to_string();
        self.pool
            .execute(|conn| -> std::result::Result<(), Error> {
                let claimed = self.repository.close_pending_in_transaction(
                    conn,
                    &transaction_id,
                    transaction_status,
                    now,
                )?;
                if claimed == 0 {
                    return Err(
                        TransactionError::AlreadyProcessed(transaction_id.clone()).into()
                    );
                }
                self.payment_repository.close_pending_in_transaction(
                    conn,
                    &transaction_id,
                    PaymentStatus::Failed,
                    now,
                )?;
                Ok(())
            })
            .map_err(Self::unwrap_root)?;

        self.repository.get_by_id(&transaction_id)
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    /// Submits a buy or sell order: a pending transaction plus its pending
    /// payment leg, then a one-shot gateway request. A gateway failure
    /// leaves the order pending for the admin or a later callback to
    /// resolve.
    async fn initiate_order(
        &self,
        order: NewTransaction,
        method: Option<String>,
    ) -> Result<Transaction> {
        order.validate()?;

        let user = self.user_repository.get_by_id(&order.user_id).map_err(|e| match e {
            UserError::NotFound(msg) => TransactionError::NotFound(msg),
            other => TransactionError::DatabaseError(other.to_string()),
        })?;
        if !user.is_active {
            return Err(TransactionError::InvalidData(
                "User account is deactivated".to_string(),
            ));
        }

        let offering = self
            .offering_repository
            .get_by_id(&order.offering_id)
            .map_err(|e| match e {
                OfferingError::NotFound(msg) => TransactionError::NotFound(msg),
                other => TransactionError::DatabaseError(other.to_string()),
            })?;

        // Advisory check at submission; settlement re-checks under the
        // database transaction.
        match order.side {
            TransactionSide::Buy => {
                if offering.available_shares < order.shares_count {
                    return Err(TransactionError::InsufficientSupply {
                        available: offering.available_shares,
                        requested: order.shares_count,
                    });
                }
            }
            TransactionSide::Sell => {
                let owned = self
                    .holding_repository
                    .get_by_user_and_offering(&order.user_id, &order.offering_id)
                    .map(|h| h.shares_owned)
                    .unwrap_or(0);
                if owned < order.shares_count {
                    return Err(TransactionError::InsufficientHoldings {
                        owned,
                        requested: order.shares_count,
                    });
                }
            }
        }

        let amount = Self::order_amount(order.shares_count, offering.price_per_share)?;
        let now = chrono::Utc::now().naive_utc();
        let transaction_db = TransactionDB {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: order.user_id.clone(),
            offering_id: order.offering_id.clone(),
            side: order.side.as_str().to_string(),
            shares_count: order.shares_count,
            price: offering.price_per_share,
            status: TransactionStatus::Pending.as_str().to_string(),
            notes: order.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let direction = match order.side {
            TransactionSide::Buy => PaymentDirection::In,
            TransactionSide::Sell => PaymentDirection::Out,
        };

        let (transaction, payment) = self
            .pool
            .execute(|conn| -> std::result::Result<(Transaction, Payment), Error> {
                let transaction = self
                    .repository
                    .create_in_transaction(conn, &transaction_db)?;
                let payment = self.payment_repository.create_in_transaction(
                    conn,
                    NewPayment {
                        user_id: order.user_id.clone(),
                        transaction_id: transaction.id.clone(),
                        amount,
                        direction,
                        method: method.clone(),
                    },
                )?;
                Ok((transaction, payment))
            })
            .map_err(Self::unwrap_root)?;

        self.invalidate_after_write(&transaction.user_id, &transaction.offering_id);
        debug!(
            "Submitted {} order {} for {} shares",
            transaction.side, transaction.id, transaction.shares_count
        );

        let gateway_result = match order.side {
            TransactionSide::Buy => {
                self.gateway
                    .checkout(&user.phone, amount, &transaction.id)
                    .await
            }
            TransactionSide::Sell => {
                self.gateway
                    .disburse(&user.phone, amount, &transaction.id)
                    .await
            }
        };

        match gateway_result {
            Ok(receipt) => {
                if let Some(external_id) = &receipt.external_id {
                    self.payment_repository
                        .set_external_id(&payment.id, external_id)
                        .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;
                }
                if receipt.status == PaymentStatus::Failed {
                    warn!("Gateway declined order {} synchronously", transaction.id);
                    return self.close_without_settlement(
                        &transaction.id,
                        TransactionStatus::Failed,
                        chrono::Utc::now().naive_utc(),
                    );
                }
                Ok(transaction)
            }
            Err(e) => {
                warn!(
                    "Gateway request for order {} failed, order stays pending: {}",
                    transaction.id, e
                );
                Err(match e {
                    crate::payments::PaymentError::GatewayRejected(msg) => {
                        TransactionError::GatewayRejected(msg)
                    }
                    other => TransactionError::GatewayUnreachable(other.to_string()),
                })
            }
        }
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.repository.get_by_id(transaction_id)
    }

    /// Lists a user's transactions through the read cache.
    fn list_user_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let key = keys::user_transactions(user_id);
        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_str::<Vec<Transaction>>(&cached) {
                Ok(transactions) => return Ok(transactions),
                Err(e) => warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let transactions = self.repository.list_for_user(user_id)?;
        if let Ok(serialized) = serde_json::to_string(&transactions) {
            self.cache.set(&key, serialized, self.cache_ttl);
        }
        Ok(transactions)
    }

    fn list_transactions(
        &self,
        status_filter: Option<TransactionStatus>,
    ) -> Result<Vec<Transaction>> {
        self.repository.list_all(status_filter)
    }

    /// Settles a pending transaction and completes its payment leg, all
    /// inside one database transaction. Approving twice is rejected.
    fn approve_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let now = chrono::Utc::now().naive_utc();
        let settled = self
            .pool
            .execute(|conn| -> std::result::Result<Transaction, Error> {
                match settle(conn, transaction_id)? {
                    SettlementOutcome::Settled(transaction) => {
                        self.payment_repository.close_pending_in_transaction(
                            conn,
                            transaction_id,
                            PaymentStatus::Completed,
                            now,
                        )?;
                        Ok(transaction)
                    }
                    SettlementOutcome::AlreadySettled => {
                        Err(TransactionError::AlreadyProcessed(transaction_id.to_string()).into())
                    }
                }
            })
            .map_err(Self::unwrap_root)?;

        self.invalidate_after_write(&settled.user_id, &settled.offering_id);
        Ok(settled)
    }

    /// Declines a pending transaction without touching shares; the payment
    /// leg is marked failed.
    fn reject_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let now = chrono::Utc::now().naive_utc();
        let transaction =
            self.close_without_settlement(transaction_id, TransactionStatus::Rejected, now)?;
        self.invalidate_after_write(&transaction.user_id, &transaction.offering_id);
        Ok(transaction)
    }
}
