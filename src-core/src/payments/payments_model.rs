use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::payments_errors::PaymentError;

/// Direction of the money movement relative to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentDirection {
    In,
    Out,
}

impl PaymentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentDirection::In => "in",
            PaymentDirection::Out => "out",
        }
    }
}

impl fmt::Display for PaymentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentDirection {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(PaymentDirection::In),
            "out" => Ok(PaymentDirection::Out),
            other => Err(PaymentError::InvalidData(format!(
                "Unknown payment direction '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(PaymentError::InvalidData(format!(
                "Unknown payment status '{}'",
                other
            ))),
        }
    }
}

/// Domain model for the money leg of a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub transaction_id: String,
    pub amount: f64,
    pub direction: PaymentDirection,
    pub status: PaymentStatus,
    pub external_id: Option<String>,
    pub method: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for recording a pending payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: String,
    pub transaction_id: String,
    pub amount: f64,
    pub direction: PaymentDirection,
    pub method: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> super::Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(PaymentError::InvalidData(
                "Payment amount must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body posted by the mobile-money provider to the callback endpoint.
/// Either the local transaction id or the provider's external id must be
/// present for the callback to match anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub transaction_id: Option<String>,
    pub external_id: Option<String>,
    pub status: String,
    pub amount: Option<f64>,
}

/// Database model for payments
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentDB {
    pub id: String,
    pub user_id: String,
    pub transaction_id: String,
    pub amount: f64,
    pub direction: String,
    pub status: String,
    pub external_id: Option<String>,
    pub method: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<PaymentDB> for Payment {
    type Error = PaymentError;

    fn try_from(db: PaymentDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            user_id: db.user_id,
            transaction_id: db.transaction_id,
            amount: db.amount,
            direction: db.direction.parse()?,
            status: db.status.parse()?,
            external_id: db.external_id,
            method: db.method,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}

impl From<NewPayment> for PaymentDB {
    fn from(domain: NewPayment) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: String::new(), // Assigned by the repository
            user_id: domain.user_id,
            transaction_id: domain.transaction_id,
            amount: domain.amount,
            direction: domain.direction.as_str().to_string(),
            status: PaymentStatus::Pending.as_str().to_string(),
            external_id: None,
            method: domain.method,
            created_at: now,
            updated_at: now,
        }
    }
}
