use log::{info, warn};
use std::sync::Arc;

use crate::cache::{keys, Cache};
use crate::db::{DbPool, DbTransactionExecutor};
use crate::errors::Error;
use crate::payments::{PaymentError, Result};
use crate::transactions::{settle, SettlementOutcome, TransactionStatus};

use super::gateway::normalize_status;
use super::payments_model::{CallbackPayload, Payment, PaymentStatus};
use super::payments_repository::PaymentRepository;

/// What a provider callback ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The transaction settled and the payment completed.
    Settled,
    /// The transaction and payment were marked failed.
    Failed,
    /// The referenced transaction was already in a terminal state.
    Duplicate,
    /// Nothing in the system matches the callback.
    Unmatched,
    /// The provider reported a non-terminal status.
    Ignored,
}

/// Service for payment history and provider callbacks.
pub struct PaymentService {
    pool: Arc<DbPool>,
    repository: PaymentRepository,
    transaction_repository: crate::transactions::TransactionRepository,
    cache: Arc<dyn Cache>,
}

impl PaymentService {
    /// Creates a new PaymentService instance
    pub fn new(pool: Arc<DbPool>, cache: Arc<dyn Cache>) -> Self {
        Self {
            repository: PaymentRepository::new(pool.clone()),
            transaction_repository: crate::transactions::TransactionRepository::new(pool.clone()),
            pool,
            cache,
        }
    }

    pub fn get_payment_for_transaction(&self, transaction_id: &str) -> Result<Payment> {
        self.repository.get_by_transaction(transaction_id)
    }

    pub fn list_user_payments(&self, user_id: &str) -> Result<Vec<Payment>> {
        self.repository.list_for_user(user_id)
    }

    /// Correlates a callback to a payment: by our transaction id first,
    /// then by the provider's external id.
    fn match_payment(&self, payload: &CallbackPayload) -> Result<Option<Payment>> {
        if let Some(transaction_id) = &payload.transaction_id {
            match self.repository.get_by_transaction(transaction_id) {
                Ok(payment) => return Ok(Some(payment)),
                Err(PaymentError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if let Some(external_id) = &payload.external_id {
            return self.repository.get_by_external_id(external_id);
        }
        Ok(None)
    }

    fn unwrap_root(err: Error) -> PaymentError {
        match err {
            Error::Payment(e) => e,
            other => PaymentError::DatabaseError(other.to_string()),
        }
    }

    /// Applies a provider callback. Completed settles the order, failed
    /// closes it, anything unmatched or repeated is acknowledged without
    /// changing state.
    pub fn handle_callback(&self, payload: &CallbackPayload) -> Result<CallbackOutcome> {
        let payment = match self.match_payment(payload)? {
            Some(payment) => payment,
            None => {
                warn!(
                    "Callback matched no payment (transaction_id={:?}, external_id={:?})",
                    payload.transaction_id, payload.external_id
                );
                return Ok(CallbackOutcome::Unmatched);
            }
        };

        if let Some(reported) = payload.amount {
            if (reported - payment.amount).abs() > 0.005 {
                warn!(
                    "Callback amount {} differs from recorded {} for payment {}",
                    reported, payment.amount, payment.id
                );
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let outcome = match normalize_status(&payload.status) {
            PaymentStatus::Completed => self
                .pool
                .execute(|conn| -> std::result::Result<CallbackOutcome, Error> {
                    match settle(conn, &payment.transaction_id)? {
                        SettlementOutcome::Settled(_) => {
                            self.repository.close_pending_in_transaction(
                                conn,
                                &payment.transaction_id,
                                PaymentStatus::Completed,
                                now,
                            )?;
                            Ok(CallbackOutcome::Settled)
                        }
                        SettlementOutcome::AlreadySettled => Ok(CallbackOutcome::Duplicate),
                    }
                })
                .map_err(Self::unwrap_root)?,
            PaymentStatus::Failed => self
                .pool
                .execute(|conn| -> std::result::Result<CallbackOutcome, Error> {
                    let claimed = self.transaction_repository.close_pending_in_transaction(
                        conn,
                        &payment.transaction_id,
                        TransactionStatus::Failed,
                        now,
                    )?;
                    if claimed == 0 {
                        return Ok(CallbackOutcome::Duplicate);
                    }
                    self.repository.close_pending_in_transaction(
                        conn,
                        &payment.transaction_id,
                        PaymentStatus::Failed,
                        now,
                    )?;
                    Ok(CallbackOutcome::Failed)
                })
                .map_err(Self::unwrap_root)?,
            PaymentStatus::Pending => {
                info!(
                    "Callback for payment {} reported non-terminal status '{}'",
                    payment.id, payload.status
                );
                CallbackOutcome::Ignored
            }
        };

        if matches!(outcome, CallbackOutcome::Settled | CallbackOutcome::Failed) {
            self.cache.remove(&[
                &keys::user_transactions(&payment.user_id),
                &keys::user_portfolio(&payment.user_id),
                keys::OFFERINGS_ALL,
            ]);
            info!(
                "Callback processed for payment {} with outcome {:?}",
                payment.id, outcome
            );
        }

        Ok(outcome)
    }
}
