use serde::{Deserialize, Serialize};

/// One offering position valued at the offering's current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub offering_id: String,
    pub company_name: String,
    pub shares_owned: i64,
    pub average_price: f64,
    pub current_price: f64,
    pub cost_basis: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
}

/// A user's full position summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub user_id: String,
    pub positions: Vec<PortfolioPosition>,
    pub total_cost_basis: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
}
