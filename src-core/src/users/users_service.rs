use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::users_model::{NewUser, User, UserRole};
use super::users_repository::UserRepository;
use super::users_traits::UserServiceTrait;
use crate::users::{Result, UserError};

/// Service for managing users
pub struct UserService {
    repository: UserRepository,
}

impl UserService {
    /// Creates a new UserService instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            repository: UserRepository::new(pool),
        }
    }

    fn guard_not_admin(&self, user: &User) -> Result<()> {
        if user.role == UserRole::Admin {
            return Err(UserError::AdminImmutable);
        }
        Ok(())
    }
}

impl UserServiceTrait for UserService {
    fn register_user(&self, new_user: NewUser) -> Result<User> {
        debug!("Registering user with phone {}", new_user.phone);
        self.repository.create(new_user)
    }

    fn get_user(&self, user_id: &str) -> Result<User> {
        self.repository.get_by_id(user_id)
    }

    fn get_user_by_phone(&self, phone: &str) -> Result<User> {
        self.repository.get_by_phone(phone)
    }

    fn list_users(&self, is_active_filter: Option<bool>) -> Result<Vec<User>> {
        self.repository.list(is_active_filter)
    }

    /// Toggles the active flag. Admin accounts cannot be deactivated.
    fn set_user_active(&self, user_id: &str, active: bool) -> Result<User> {
        let user = self.repository.get_by_id(user_id)?;
        self.guard_not_admin(&user)?;
        self.repository.set_active(user_id, active)
    }

    fn update_password(&self, user_id: &str, new_hash: &str) -> Result<()> {
        self.repository.get_by_id(user_id)?;
        self.repository.update_password(user_id, new_hash)
    }

    /// Deletes a user. Admin accounts cannot be deleted.
    fn delete_user(&self, user_id: &str) -> Result<()> {
        let user = self.repository.get_by_id(user_id)?;
        self.guard_not_admin(&user)?;
        self.repository.delete(user_id)?;
        Ok(())
    }
}
