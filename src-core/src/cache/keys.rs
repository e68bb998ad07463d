//! Cache key builders shared by the read paths and the write-side
//! invalidation hooks.

pub const OFFERINGS_ALL: &str = "offerings:all";

pub fn offering_detail(offering_id: &str) -> String {
    format!("offerings:{}", offering_id)
}

pub fn user_transactions(user_id: &str) -> String {
    format!("user:{}:transactions", user_id)
}

pub fn user_portfolio(user_id: &str) -> String {
    format!("user:{}:portfolio", user_id)
}
