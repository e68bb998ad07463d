use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::offerings::{OfferingError, Result};
use crate::schema::offerings;
use crate::schema::offerings::dsl::*;
use crate::schema::{holdings, transactions};

use super::offerings_model::{NewOffering, Offering, OfferingDB, OfferingUpdate};

/// Repository for managing offering records in the database
pub struct OfferingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl OfferingRepository {
    /// Creates a new OfferingRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Creates a new offering in the database
    pub fn create(&self, new_offering: NewOffering) -> Result<Offering> {
        new_offering.validate()?;

        let mut offering_db: OfferingDB = new_offering.into();
        offering_db.id = uuid::Uuid::new_v4().to_string();

        let mut conn =
            get_connection(&self.pool).map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        diesel::insert_into(offerings::table)
            .values(&offering_db)
            .execute(&mut conn)
            .map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        Ok(offering_db.into())
    }

    /// Applies a partial update to an offering
    pub fn update(&self, update: OfferingUpdate) -> Result<Offering> {
        update.validate()?;

        let mut conn =
            get_connection(&self.pool).map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        let existing = offerings
            .find(&update.id)
            .first::<OfferingDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    OfferingError::NotFound(format!("Offering with id {} not found", update.id))
                }
                _ => OfferingError::DatabaseError(e.to_string()),
            })?;

        let mut changed = existing.clone();
        if let Some(name) = update.company_name {
            changed.company_name = name;
        }
        if let Some(price) = update.price_per_share {
            changed.price_per_share = price;
        }
        if let Some(total) = update.total_shares {
            let delta = total - existing.total_shares;
            let new_available = existing.available_shares + delta;
            if new_available < 0 {
                return Err(OfferingError::InvalidData(
                    "Cannot shrink total shares below the amount already sold".to_string(),
                ));
            }
            changed.total_shares = total;
            changed.available_shares = new_available;
        }

        diesel::update(offerings.find(&changed.id))
            .set(&changed)
            .execute(&mut conn)
            .map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        Ok(changed.into())
    }

    /// Retrieves an offering by its ID
    pub fn get_by_id(&self, offering_id: &str) -> Result<Offering> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        let offering = offerings
            .find(offering_id)
            .first::<OfferingDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    OfferingError::NotFound(format!("Offering with id {} not found", offering_id))
                }
                _ => OfferingError::DatabaseError(e.to_string()),
            })?;

        Ok(offering.into())
    }

    /// Lists all offerings, newest first
    pub fn list(&self) -> Result<Vec<Offering>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        offerings::table
            .order(created_at.desc())
            .load::<OfferingDB>(&mut conn)
            .map_err(|e| OfferingError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Offering::from).collect())
    }

    /// Returns true when any holding or transaction still references the offering
    pub fn is_referenced(&self, offering_id: &str) -> Result<bool> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        let holding_count: i64 = holdings::table
            .filter(holdings::offering_id.eq(offering_id))
            .count()
            .get_result(&mut conn)
            .map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        if holding_count > 0 {
            return Ok(true);
        }

        let transaction_count: i64 = transactions::table
            .filter(transactions::offering_id.eq(offering_id))
            .count()
            .get_result(&mut conn)
            .map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        Ok(transaction_count > 0)
    }

    /// Deletes an offering by its ID and returns the number of deleted records
    pub fn delete(&self, offering_id: &str) -> Result<usize> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        let affected = diesel::delete(offerings.find(offering_id))
            .execute(&mut conn)
            .map_err(|e| OfferingError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(OfferingError::NotFound(format!(
                "Offering with id {} not found",
                offering_id
            )));
        }

        Ok(affected)
    }
}
