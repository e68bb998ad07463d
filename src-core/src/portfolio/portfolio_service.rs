use log::warn;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{keys, Cache};
use crate::db::DbPool;
use crate::dividends::{DividendPayout, DividendRepository};
use crate::errors::{Error, Result, ValidationError};
use crate::holdings::HoldingRepository;
use crate::offerings::OfferingRepository;

use super::portfolio_model::{PortfolioPosition, PortfolioSummary};

/// Service assembling a user's position summary and dividend history.
pub struct PortfolioService {
    holding_repository: HoldingRepository,
    offering_repository: OfferingRepository,
    dividend_repository: DividendRepository,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
}

impl PortfolioService {
    /// Creates a new PortfolioService instance
    pub fn new(pool: Arc<DbPool>, cache: Arc<dyn Cache>, cache_ttl: Duration) -> Self {
        Self {
            holding_repository: HoldingRepository::new(pool.clone()),
            offering_repository: OfferingRepository::new(pool.clone()),
            dividend_repository: DividendRepository::new(pool),
            cache,
            cache_ttl,
        }
    }

    /// Values every holding at its offering's current price, through the
    /// read cache.
    pub fn get_portfolio(&self, user_id: &str) -> Result<PortfolioSummary> {
        let key = keys::user_portfolio(user_id);
        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_str::<PortfolioSummary>(&cached) {
                Ok(summary) => return Ok(summary),
                Err(e) => warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let holdings = self.holding_repository.list_for_user(user_id)?;

        let mut positions = Vec::with_capacity(holdings.len());
        let mut total_cost = Decimal::ZERO;
        let mut total_value = Decimal::ZERO;

        for holding in holdings {
            let offering = self.offering_repository.get_by_id(&holding.offering_id)?;

            let shares = Decimal::from(holding.shares_owned);
            let average = Decimal::from_f64_retain(holding.average_price).ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(
                    "Average price is not a number".to_string(),
                ))
            })?;
            let current = Decimal::from_f64_retain(offering.price_per_share).ok_or_else(|| {
                Error::Validation(ValidationError::InvalidInput(
                    "Offering price is not a number".to_string(),
                ))
            })?;

            let cost_basis = shares * average;
            let current_value = shares * current;
            let profit_loss = current_value - cost_basis;
            let profit_loss_percent = if cost_basis.is_zero() {
                Decimal::ZERO
            } else {
                profit_loss / cost_basis * Decimal::from(100)
            };

            total_cost += cost_basis;
            total_value += current_value;

            positions.push(PortfolioPosition {
                offering_id: holding.offering_id,
                company_name: offering.company_name,
                shares_owned: holding.shares_owned,
                average_price: holding.average_price,
                current_price: offering.price_per_share,
                cost_basis: cost_basis.to_f64().unwrap_or_default(),
                current_value: current_value.to_f64().unwrap_or_default(),
                profit_loss: profit_loss.to_f64().unwrap_or_default(),
                profit_loss_percent: profit_loss_percent.to_f64().unwrap_or_default(),
            });
        }

        let summary = PortfolioSummary {
            user_id: user_id.to_string(),
            positions,
            total_cost_basis: total_cost.to_f64().unwrap_or_default(),
            total_value: total_value.to_f64().unwrap_or_default(),
            total_profit_loss: (total_value - total_cost).to_f64().unwrap_or_default(),
        };

        if let Ok(serialized) = serde_json::to_string(&summary) {
            self.cache.set(&key, serialized, self.cache_ttl);
        }
        Ok(summary)
    }

    /// A user's dividend payouts, amounts fixed by the share snapshot taken
    /// when each dividend was declared.
    pub fn get_dividend_history(&self, user_id: &str) -> Result<Vec<DividendPayout>> {
        Ok(self.dividend_repository.list_payouts_for_user(user_id)?)
    }
}
