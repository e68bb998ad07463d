use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::payments::{PaymentError, Result};
use crate::schema::payments;

use super::payments_model::{NewPayment, Payment, PaymentDB, PaymentStatus};

/// Repository for managing payment records in the database
pub struct PaymentRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Inserts a pending payment row on an existing connection
    pub fn create_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        new_payment: NewPayment,
    ) -> Result<Payment> {
        new_payment.validate()?;

        let mut payment_db: PaymentDB = new_payment.into();
        payment_db.id = uuid::Uuid::new_v4().to_string();

        diesel::insert_into(payments::table)
            .values(&payment_db)
            .execute(conn)
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        payment_db.try_into()
    }

    /// Retrieves the payment attached to a transaction
    pub fn get_by_transaction(&self, transaction_id: &str) -> Result<Payment> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        let record = payments::table
            .filter(payments::transaction_id.eq(transaction_id))
            .first::<PaymentDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => PaymentError::NotFound(format!(
                    "Payment for transaction {} not found",
                    transaction_id
                )),
                _ => PaymentError::DatabaseError(e.to_string()),
            })?;

        record.try_into()
    }

    /// Retrieves a payment by the gateway's external id
    pub fn get_by_external_id(&self, ext_id: &str) -> Result<Option<Payment>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        payments::table
            .filter(payments::external_id.eq(ext_id))
            .first::<PaymentDB>(&mut conn)
            .optional()
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?
            .map(Payment::try_from)
            .transpose()
    }

    /// Lists a user's payments, newest first
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Payment>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        payments::table
            .filter(payments::user_id.eq(user_id))
            .order(payments::created_at.desc())
            .load::<PaymentDB>(&mut conn)
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(Payment::try_from)
            .collect()
    }

    /// Records the gateway's external id for a payment
    pub fn set_external_id(&self, payment_id: &str, ext_id: &str) -> Result<()> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        diesel::update(payments::table.find(payment_id))
            .set((
                payments::external_id.eq(ext_id),
                payments::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Moves a transaction's pending payment to a terminal status on an
    /// existing connection. Returns the number of rows changed.
    pub fn close_pending_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        transaction_id: &str,
        new_status: PaymentStatus,
        now: NaiveDateTime,
    ) -> Result<usize> {
        diesel::update(
            payments::table
                .filter(payments::transaction_id.eq(transaction_id))
                .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
        )
        .set((
            payments::status.eq(new_status.as_str()),
            payments::updated_at.eq(now),
        ))
        .execute(conn)
        .map_err(|e| PaymentError::DatabaseError(e.to_string()))
    }
}
