use std::sync::Arc;

use axum::{extract::State, routing::get, Extension, Json, Router};

use faltasi_core::dividends::DividendPayout;
use faltasi_core::portfolio::PortfolioSummary;

use crate::{auth::AuthenticatedUser, error::ApiResult, main_lib::AppState};

async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<PortfolioSummary>> {
    let summary = state.portfolio_service.get_portfolio(&identity.user_id)?;
    Ok(Json(summary))
}

async fn get_dividend_history(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<DividendPayout>>> {
    let payouts = state
        .portfolio_service
        .get_dividend_history(&identity.user_id)?;
    Ok(Json(payouts))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolio", get(get_portfolio))
        .route("/portfolio/dividends", get(get_dividend_history))
}
