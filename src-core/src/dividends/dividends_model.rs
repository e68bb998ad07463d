use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::dividends_errors::DividendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Paid,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = DividendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "paid" => Ok(PayoutStatus::Paid),
            other => Err(DividendError::InvalidData(format!(
                "Unknown payout status '{}'",
                other
            ))),
        }
    }
}

/// Domain model for a declared dividend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    pub id: String,
    pub offering_id: String,
    pub amount_per_share: f64,
    pub declared_at: NaiveDateTime,
}

/// Input model for declaring a dividend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDividend {
    pub offering_id: String,
    pub amount_per_share: f64,
}

impl NewDividend {
    pub fn validate(&self) -> super::Result<()> {
        if self.offering_id.trim().is_empty() {
            return Err(DividendError::InvalidData(
                "Offering id cannot be empty".to_string(),
            ));
        }
        if !self.amount_per_share.is_finite() || self.amount_per_share <= 0.0 {
            return Err(DividendError::InvalidData(
                "Amount per share must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Domain model for one holder's share of a dividend. The share count is a
/// snapshot taken at declaration, so later trades never change the payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendPayout {
    pub id: String,
    pub user_id: String,
    pub dividend_id: String,
    pub shares_at_declaration: i64,
    pub amount: f64,
    pub status: PayoutStatus,
    pub paid_at: Option<NaiveDateTime>,
}

/// Database model for dividends
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::dividends)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DividendDB {
    pub id: String,
    pub offering_id: String,
    pub amount_per_share: f64,
    pub declared_at: NaiveDateTime,
}

impl From<DividendDB> for Dividend {
    fn from(db: DividendDB) -> Self {
        Self {
            id: db.id,
            offering_id: db.offering_id,
            amount_per_share: db.amount_per_share,
            declared_at: db.declared_at,
        }
    }
}

/// Database model for dividend payouts
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::dividend_payouts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DividendPayoutDB {
    pub id: String,
    pub user_id: String,
    pub dividend_id: String,
    pub shares_at_declaration: i64,
    pub amount: f64,
    pub status: String,
    pub paid_at: Option<NaiveDateTime>,
}

impl TryFrom<DividendPayoutDB> for DividendPayout {
    type Error = DividendError;

    fn try_from(db: DividendPayoutDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            user_id: db.user_id,
            dividend_id: db.dividend_id,
            shares_at_declaration: db.shares_at_declaration,
            amount: db.amount,
            status: db.status.parse()?,
            paid_at: db.paid_at,
        })
    }
}
