use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::users;
use crate::schema::users::dsl::*;
use crate::users::{Result, UserError};

use super::users_model::{NewUser, User, UserDB};

/// Repository for managing user records in the database
pub struct UserRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl UserRepository {
    /// Creates a new UserRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database
    pub fn create(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;

        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if self.phone_exists(&new_user.phone)? {
            return Err(UserError::PhoneAlreadyRegistered(new_user.phone));
        }

        let mut user_db: UserDB = new_user.into();
        user_db.id = uuid::Uuid::new_v4().to_string();

        diesel::insert_into(users::table)
            .values(&user_db)
            .execute(&mut conn)
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        user_db.try_into()
    }

    /// Retrieves a user by its ID
    pub fn get_by_id(&self, user_id: &str) -> Result<User> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let user = users
            .find(user_id)
            .first::<UserDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    UserError::NotFound(format!("User with id {} not found", user_id))
                }
                _ => UserError::DatabaseError(e.to_string()),
            })?;

        user.try_into()
    }

    /// Retrieves a user by phone number
    pub fn get_by_phone(&self, phone_number: &str) -> Result<User> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let user = users
            .filter(phone.eq(phone_number))
            .first::<UserDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    UserError::NotFound(format!("User with phone {} not found", phone_number))
                }
                _ => UserError::DatabaseError(e.to_string()),
            })?;

        user.try_into()
    }

    /// Checks whether a phone number is already registered
    pub fn phone_exists(&self, phone_number: &str) -> Result<bool> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let count: i64 = users
            .filter(phone.eq(phone_number))
            .count()
            .get_result(&mut conn)
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(count > 0)
    }

    /// Lists users, optionally filtering by active status
    pub fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<User>> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let mut query = users::table.into_boxed();

        if let Some(active) = is_active_filter {
            query = query.filter(is_active.eq(active));
        }

        query
            .order(created_at.desc())
            .load::<UserDB>(&mut conn)
            .map_err(|e| UserError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    /// Sets the active flag on a user
    pub fn set_active(&self, user_id: &str, active: bool) -> Result<User> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let affected = diesel::update(users.find(user_id))
            .set(is_active.eq(active))
            .execute(&mut conn)
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(UserError::NotFound(format!(
                "User with id {} not found",
                user_id
            )));
        }

        self.get_by_id(user_id)
    }

    /// Replaces the stored password hash for a user
    pub fn update_password(&self, user_id: &str, new_hash: &str) -> Result<()> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let affected = diesel::update(users.find(user_id))
            .set(password_hash.eq(new_hash))
            .execute(&mut conn)
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(UserError::NotFound(format!(
                "User with id {} not found",
                user_id
            )));
        }

        Ok(())
    }

    /// Deletes a user by its ID and returns the number of deleted records
    pub fn delete(&self, user_id: &str) -> Result<usize> {
        let mut conn =
            get_connection(&self.pool).map_err(|e| UserError::DatabaseError(e.to_string()))?;

        let affected = diesel::delete(users.find(user_id))
            .execute(&mut conn)
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(UserError::NotFound(format!(
                "User with id {} not found",
                user_id
            )));
        }

        Ok(affected)
    }
}
