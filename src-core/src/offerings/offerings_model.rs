use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::offerings_errors::OfferingError;

/// Domain model for a share offering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub id: String,
    pub company_name: String,
    pub total_shares: i64,
    pub price_per_share: f64,
    pub available_shares: i64,
    pub created_at: NaiveDateTime,
}

/// Input model for creating a new offering. All shares start available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffering {
    pub company_name: String,
    pub total_shares: i64,
    pub price_per_share: f64,
}

impl NewOffering {
    pub fn validate(&self) -> super::Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(OfferingError::InvalidData(
                "Company name cannot be empty".to_string(),
            ));
        }
        if self.total_shares <= 0 {
            return Err(OfferingError::InvalidData(
                "Total shares must be positive".to_string(),
            ));
        }
        if !self.price_per_share.is_finite() || self.price_per_share <= 0.0 {
            return Err(OfferingError::InvalidData(
                "Price per share must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input model for updating an offering. Omitted fields are left unchanged;
/// a change to total_shares shifts available_shares by the same amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingUpdate {
    pub id: String,
    pub company_name: Option<String>,
    pub total_shares: Option<i64>,
    pub price_per_share: Option<f64>,
}

impl OfferingUpdate {
    pub fn validate(&self) -> super::Result<()> {
        if self.id.trim().is_empty() {
            return Err(OfferingError::InvalidData(
                "Offering id cannot be empty".to_string(),
            ));
        }
        if let Some(name) = &self.company_name {
            if name.trim().is_empty() {
                return Err(OfferingError::InvalidData(
                    "Company name cannot be empty".to_string(),
                ));
            }
        }
        if let Some(total) = self.total_shares {
            if total <= 0 {
                return Err(OfferingError::InvalidData(
                    "Total shares must be positive".to_string(),
                ));
            }
        }
        if let Some(price) = self.price_per_share {
            if !price.is_finite() || price <= 0.0 {
                return Err(OfferingError::InvalidData(
                    "Price per share must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Database model for offerings
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::offerings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OfferingDB {
    pub id: String,
    pub company_name: String,
    pub total_shares: i64,
    pub price_per_share: f64,
    pub available_shares: i64,
    pub created_at: NaiveDateTime,
}

impl From<OfferingDB> for Offering {
    fn from(db: OfferingDB) -> Self {
        Self {
            id: db.id,
            company_name: db.company_name,
            total_shares: db.total_shares,
            price_per_share: db.price_per_share,
            available_shares: db.available_shares,
            created_at: db.created_at,
        }
    }
}

impl From<NewOffering> for OfferingDB {
    fn from(domain: NewOffering) -> Self {
        Self {
            id: String::new(), // Assigned by the repository
            company_name: domain.company_name,
            total_shares: domain.total_shares,
            price_per_share: domain.price_per_share,
            available_shares: domain.total_shares,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
