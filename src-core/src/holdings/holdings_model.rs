use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Domain model for a user's position in one offering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub offering_id: String,
    pub shares_owned: i64,
    pub average_price: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for holdings
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub user_id: String,
    pub offering_id: String,
    pub shares_owned: i64,
    pub average_price: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            offering_id: db.offering_id,
            shares_owned: db.shares_owned,
            average_price: db.average_price,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
