use super::users_model::{NewUser, User};
use crate::users::Result;

/// Trait defining the contract for user service operations.
pub trait UserServiceTrait: Send + Sync {
    fn register_user(&self, new_user: NewUser) -> Result<User>;
    fn get_user(&self, user_id: &str) -> Result<User>;
    fn get_user_by_phone(&self, phone: &str) -> Result<User>;
    fn list_users(&self, is_active_filter: Option<bool>) -> Result<Vec<User>>;
    fn set_user_active(&self, user_id: &str, active: bool) -> Result<User>;
    fn update_password(&self, user_id: &str, new_hash: &str) -> Result<()>;
    fn delete_user(&self, user_id: &str) -> Result<()>;
}
