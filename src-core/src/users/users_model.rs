use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::users_errors::UserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Investor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Investor => "investor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "investor" => Ok(UserRole::Investor),
            other => Err(UserError::InvalidData(format!("Unknown role '{}'", other))),
        }
    }
}

/// Domain model representing a registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Input model for registering a new user. The password is hashed by the
/// caller before it reaches the core crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl NewUser {
    pub fn validate(&self) -> super::Result<()> {
        if self.name.trim().is_empty() {
            return Err(UserError::InvalidData("Name cannot be empty".to_string()));
        }
        if self.phone.trim().is_empty() {
            return Err(UserError::InvalidData("Phone cannot be empty".to_string()));
        }
        if self.password_hash.trim().is_empty() {
            return Err(UserError::InvalidData(
                "Password hash cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for users
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl TryFrom<UserDB> for User {
    type Error = UserError;

    fn try_from(db: UserDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            name: db.name,
            phone: db.phone,
            password_hash: db.password_hash,
            role: db.role.parse()?,
            is_active: db.is_active,
            created_at: db.created_at,
        })
    }
}

impl From<NewUser> for UserDB {
    fn from(domain: NewUser) -> Self {
        Self {
            id: String::new(), // Assigned by the repository
            name: domain.name,
            phone: domain.phone,
            password_hash: domain.password_hash,
            role: domain.role.as_str().to_string(),
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
