use log::info;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::{DbPool, DbTransactionExecutor};
use crate::dividends::{DividendError, Result};
use crate::errors::Error;
use crate::holdings::HoldingRepository;
use crate::offerings::{OfferingError, OfferingRepository};

use super::dividends_model::{
    Dividend, DividendDB, DividendPayout, DividendPayoutDB, NewDividend, PayoutStatus,
};
use super::dividends_repository::DividendRepository;

/// Service for dividend declaration and payout lifecycle.
pub struct DividendService {
    pool: Arc<DbPool>,
    repository: DividendRepository,
    offering_repository: OfferingRepository,
    holding_repository: HoldingRepository,
}

impl DividendService {
    /// Creates a new DividendService instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self {
            repository: DividendRepository::new(pool.clone()),
            offering_repository: OfferingRepository::new(pool.clone()),
            holding_repository: HoldingRepository::new(pool.clone()),
            pool,
        }
    }

    fn unwrap_root(err: Error) -> DividendError {
        match err {
            Error::Dividend(e) => e,
            other => DividendError::DatabaseError(other.to_string()),
        }
    }

    fn payout_amount(shares: i64, amount_per_share: f64) -> Result<f64> {
        let per_share = Decimal::from_f64_retain(amount_per_share).ok_or_else(|| {
            DividendError::InvalidData("Amount per share is not a number".to_string())
        })?;
        (Decimal::from(shares) * per_share).to_f64().ok_or_else(|| {
            DividendError::InvalidData("Payout amount out of representable range".to_string())
        })
    }

    /// Declares a dividend and materializes one pending payout per current
    /// holder, snapshotting each holder's share count. The dividend and all
    /// payouts land in one database transaction.
    pub fn declare_dividend(&self, new_dividend: NewDividend) -> Result<Dividend> {
        new_dividend.validate()?;

        self.offering_repository
            .get_by_id(&new_dividend.offering_id)
            .map_err(|e| match e {
                OfferingError::NotFound(msg) => DividendError::NotFound(msg),
                other => DividendError::DatabaseError(other.to_string()),
            })?;

        let holders = self
            .holding_repository
            .list_for_offering(&new_dividend.offering_id)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        let now = chrono::Utc::now().naive_utc();
        let dividend_db = DividendDB {
            id: uuid::Uuid::new_v4().to_string(),
            offering_id: new_dividend.offering_id.clone(),
            amount_per_share: new_dividend.amount_per_share,
            declared_at: now,
        };

        let mut payouts = Vec::with_capacity(holders.len());
        for holding in &holders {
            payouts.push(DividendPayoutDB {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: holding.user_id.clone(),
                dividend_id: dividend_db.id.clone(),
                shares_at_declaration: holding.shares_owned,
                amount: Self::payout_amount(holding.shares_owned, new_dividend.amount_per_share)?,
                status: PayoutStatus::Pending.as_str().to_string(),
                paid_at: None,
            });
        }

        let dividend = self
            .pool
            .execute(|conn| -> std::result::Result<Dividend, Error> {
                let dividend = self.repository.create_in_transaction(conn, &dividend_db)?;
                if !payouts.is_empty() {
                    self.repository
                        .create_payouts_in_transaction(conn, &payouts)?;
                }
                Ok(dividend)
            })
            .map_err(Self::unwrap_root)?;

        info!(
            "Declared dividend {} on offering {} for {} holders",
            dividend.id,
            dividend.offering_id,
            payouts.len()
        );
        Ok(dividend)
    }

    pub fn get_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        self.repository.get_by_id(dividend_id)
    }

    pub fn list_dividends(&self) -> Result<Vec<Dividend>> {
        self.repository.list()
    }

    pub fn list_payouts(&self, dividend_id: &str) -> Result<Vec<DividendPayout>> {
        self.repository.get_by_id(dividend_id)?;
        self.repository.list_payouts_for_dividend(dividend_id)
    }

    pub fn list_user_payouts(&self, user_id: &str) -> Result<Vec<DividendPayout>> {
        self.repository.list_payouts_for_user(user_id)
    }

    /// Marks a payout paid. Paying twice is rejected.
    pub fn pay_payout(&self, payout_id: &str) -> Result<DividendPayout> {
        self.repository.get_payout_by_id(payout_id)?;

        let claimed = self
            .repository
            .mark_paid(payout_id, chrono::Utc::now().naive_utc())?;
        if claimed == 0 {
            return Err(DividendError::AlreadyPaid(payout_id.to_string()));
        }

        self.repository.get_payout_by_id(payout_id)
    }

    /// Deletes a dividend along with its payouts.
    pub fn delete_dividend(&self, dividend_id: &str) -> Result<()> {
        self.pool
            .execute(|conn| -> std::result::Result<usize, Error> {
                Ok(self.repository.delete_in_transaction(conn, dividend_id)?)
            })
            .map_err(Self::unwrap_root)?;
        Ok(())
    }
}
