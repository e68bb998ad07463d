use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::transactions_errors::TransactionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSide::Buy => "buy",
            TransactionSide::Sell => "sell",
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionSide {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TransactionSide::Buy),
            "sell" => Ok(TransactionSide::Sell),
            other => Err(TransactionError::InvalidData(format!(
                "Unknown transaction side '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "approved" => Ok(TransactionStatus::Approved),
            "rejected" => Ok(TransactionStatus::Rejected),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(TransactionError::InvalidData(format!(
                "Unknown transaction status '{}'",
                other
            ))),
        }
    }
}

/// Domain model for a buy or sell order. Price is a snapshot of the
/// offering's price at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub offering_id: String,
    pub side: TransactionSide,
    pub shares_count: i64,
    pub price: f64,
    pub status: TransactionStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for submitting a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub user_id: String,
    pub offering_id: String,
    pub side: TransactionSide,
    pub shares_count: i64,
    pub notes: Option<String>,
}

impl NewTransaction {
    pub fn validate(&self) -> super::Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(TransactionError::InvalidData(
                "User id cannot be empty".to_string(),
            ));
        }
        if self.offering_id.trim().is_empty() {
            return Err(TransactionError::InvalidData(
                "Offering id cannot be empty".to_string(),
            ));
        }
        if self.shares_count <= 0 {
            return Err(TransactionError::InvalidData(
                "Share count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for transactions
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub offering_id: String,
    pub side: String,
    pub shares_count: i64,
    pub price: f64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = TransactionError;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            user_id: db.user_id,
            offering_id: db.offering_id,
            side: db.side.parse()?,
            shares_count: db.shares_count,
            price: db.price,
            status: db.status.parse()?,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
