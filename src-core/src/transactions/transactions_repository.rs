use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::transactions;
use crate::transactions::{Result, TransactionError};

use super::transactions_model::{Transaction, TransactionDB, TransactionStatus};

/// Repository for managing transaction records in the database
pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Inserts a pending transaction row on an existing connection
    pub fn create_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        transaction_db: &TransactionDB,
    ) -> Result<Transaction> {
        diesel::insert_into(transactions::table)
            .values(transaction_db)
            .execute(conn)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        transaction_db.clone().try_into()
    }

    /// Retrieves a transaction by its ID
    pub fn get_by_id(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        let record = transactions::table
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => TransactionError::NotFound(format!(
                    "Transaction with id {} not found",
                    transaction_id
                )),
                _ => TransactionError::DatabaseError(e.to_string()),
            })?;

        record.try_into()
    }

    /// Lists a user's transactions, newest first
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        transactions::table
            .filter(transactions::user_id.eq(user_id))
            .order(transactions::created_at.desc())
            .load::<TransactionDB>(&mut conn)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Lists all transactions, optionally filtered by status
    pub fn list_all(&self, status_filter: Option<TransactionStatus>) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        let mut query = transactions::table.into_boxed();
        if let Some(status) = status_filter {
            query = query.filter(transactions::status.eq(status.as_str()));
        }

        query
            .order(transactions::created_at.desc())
            .load::<TransactionDB>(&mut conn)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Moves a pending transaction to a terminal status on an existing
    /// connection. Returns the number of rows claimed (0 when the row was
    /// no longer pending).
    pub fn close_pending_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        transaction_id: &str,
        new_status: TransactionStatus,
        now: NaiveDateTime,
    ) -> Result<usize> {
        diesel::update(
            transactions::table
                .find(transaction_id)
                .filter(transactions::status.eq(TransactionStatus::Pending.as_str())),
        )
        .set((
            transactions::status.eq(new_status.as_str()),
            transactions::updated_at.eq(now),
        ))
        .execute(conn)
        .map_err(|e| TransactionError::DatabaseError(e.to_string()))
    }
}
