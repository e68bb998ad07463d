use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::dividends::{DividendError, Result};
use crate::schema::{dividend_payouts, dividends};

use super::dividends_model::{
    Dividend, DividendDB, DividendPayout, DividendPayoutDB, PayoutStatus,
};

/// Repository for managing dividend and payout records in the database
pub struct DividendRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl DividendRepository {
    /// Creates a new DividendRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Inserts a dividend row on an existing connection
    pub fn create_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        dividend_db: &DividendDB,
    ) -> Result<Dividend> {
        diesel::insert_into(dividends::table)
            .values(dividend_db)
            .execute(conn)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        Ok(dividend_db.clone().into())
    }

    /// Inserts payout rows on an existing connection
    pub fn create_payouts_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        payouts: &[DividendPayoutDB],
    ) -> Result<usize> {
        diesel::insert_into(dividend_payouts::table)
            .values(payouts)
            .execute(conn)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))
    }

    /// Retrieves a dividend by its ID
    pub fn get_by_id(&self, dividend_id: &str) -> Result<Dividend> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        dividends::table
            .find(dividend_id)
            .first::<DividendDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    DividendError::NotFound(format!("Dividend with id {} not found", dividend_id))
                }
                _ => DividendError::DatabaseError(e.to_string()),
            })
            .map(Dividend::from)
    }

    /// Lists all dividends, newest first
    pub fn list(&self) -> Result<Vec<Dividend>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        dividends::table
            .order(dividends::declared_at.desc())
            .load::<DividendDB>(&mut conn)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Dividend::from).collect())
    }

    /// Lists the payouts of one dividend
    pub fn list_payouts_for_dividend(&self, dividend_id: &str) -> Result<Vec<DividendPayout>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        dividend_payouts::table
            .filter(dividend_payouts::dividend_id.eq(dividend_id))
            .load::<DividendPayoutDB>(&mut conn)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(DividendPayout::try_from)
            .collect()
    }

    /// Lists a user's payouts across all dividends
    pub fn list_payouts_for_user(&self, user_id: &str) -> Result<Vec<DividendPayout>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        dividend_payouts::table
            .filter(dividend_payouts::user_id.eq(user_id))
            .load::<DividendPayoutDB>(&mut conn)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(DividendPayout::try_from)
            .collect()
    }

    /// Marks a pending payout paid. Returns the number of rows claimed
    /// (0 when the payout was already paid).
    pub fn mark_paid(&self, payout_id: &str, paid_at_time: NaiveDateTime) -> Result<usize> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        diesel::update(
            dividend_payouts::table
                .find(payout_id)
                .filter(dividend_payouts::status.eq(PayoutStatus::Pending.as_str())),
        )
        .set((
            dividend_payouts::status.eq(PayoutStatus::Paid.as_str()),
            dividend_payouts::paid_at.eq(Some(paid_at_time)),
        ))
        .execute(&mut conn)
        .map_err(|e| DividendError::DatabaseError(e.to_string()))
    }

    /// Retrieves a payout by its ID
    pub fn get_payout_by_id(&self, payout_id: &str) -> Result<DividendPayout> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        let record = dividend_payouts::table
            .find(payout_id)
            .first::<DividendPayoutDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    DividendError::NotFound(format!("Payout with id {} not found", payout_id))
                }
                _ => DividendError::DatabaseError(e.to_string()),
            })?;

        record.try_into()
    }

    /// Deletes a dividend and its payouts on an existing connection
    pub fn delete_in_transaction(
        &self,
        conn: &mut SqliteConnection,
        dividend_id: &str,
    ) -> Result<usize> {
        diesel::delete(
            dividend_payouts::table.filter(dividend_payouts::dividend_id.eq(dividend_id)),
        )
        .execute(conn)
        .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        let affected = diesel::delete(dividends::table.find(dividend_id))
            .execute(conn)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(DividendError::NotFound(format!(
                "Dividend with id {} not found",
                dividend_id
            )));
        }

        Ok(affected)
    }
}
