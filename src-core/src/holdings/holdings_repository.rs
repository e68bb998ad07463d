use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::holdings::{HoldingError, Result};
use crate::schema::holdings;
use crate::schema::holdings::dsl::*;

use super::holdings_model::{Holding, HoldingDB};

/// Repository for reading holding positions. Writes go through settlement.
pub struct HoldingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl HoldingRepository {
    /// Creates a new HoldingRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Lists all holdings for a user
    pub fn list_for_user(&self, uid: &str) -> Result<Vec<Holding>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        holdings::table
            .filter(user_id.eq(uid))
            .order(updated_at.desc())
            .load::<HoldingDB>(&mut conn)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Holding::from).collect())
    }

    /// Retrieves a user's holding in one offering
    pub fn get_by_user_and_offering(&self, uid: &str, oid: &str) -> Result<Holding> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        holdings::table
            .filter(user_id.eq(uid))
            .filter(offering_id.eq(oid))
            .first::<HoldingDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => HoldingError::NotFound(format!(
                    "No holding for user {} in offering {}",
                    uid, oid
                )),
                _ => HoldingError::DatabaseError(e.to_string()),
            })
            .map(Holding::from)
    }

    /// Lists all holders of one offering
    pub fn list_for_offering(&self, oid: &str) -> Result<Vec<Holding>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        holdings::table
            .filter(offering_id.eq(oid))
            .load::<HoldingDB>(&mut conn)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Holding::from).collect())
    }

    /// Lists every holding in the system
    pub fn list_all(&self) -> Result<Vec<Holding>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        holdings::table
            .order(updated_at.desc())
            .load::<HoldingDB>(&mut conn)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Holding::from).collect())
    }
}
