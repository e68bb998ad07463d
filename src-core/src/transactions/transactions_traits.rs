use async_trait::async_trait;

use super::transactions_model::{NewTransaction, Transaction, TransactionStatus};
use crate::transactions::Result;

/// Trait defining the contract for transaction service operations.
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    async fn initiate_order(
        &self,
        order: NewTransaction,
        method: Option<String>,
    ) -> Result<Transaction>;
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    fn list_user_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;
    fn list_transactions(
        &self,
        status_filter: Option<TransactionStatus>,
    ) -> Result<Vec<Transaction>>;
    fn approve_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    fn reject_transaction(&self, transaction_id: &str) -> Result<Transaction>;
}
