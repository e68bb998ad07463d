use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use faltasi_core::dividends::{Dividend, DividendPayout, NewDividend};
use faltasi_core::holdings::{Holding, HoldingRepository};
use faltasi_core::transactions::{Transaction, TransactionServiceTrait, TransactionStatus};
use faltasi_core::users::{User, UserServiceTrait};

use crate::{
    auth::{require_admin, AuthenticatedUser},
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserListQuery {
    is_active: Option<bool>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Query(q): Query<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&identity)?;
    let users = state.user_service.list_users(q.is_active)?;
    Ok(Json(users))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveBody {
    is_active: bool,
}

async fn set_user_active(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(body): Json<ActiveBody>,
) -> ApiResult<Json<User>> {
    require_admin(&identity)?;
    let user = state.user_service.set_user_active(&id, body.is_active)?;
    Ok(Json(user))
}

async fn delete_user(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<StatusCode> {
    require_admin(&identity)?;
    state.user_service.delete_user(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionListQuery {
    status: Option<String>,
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Query(q): Query<TransactionListQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    require_admin(&identity)?;
    let status_filter = q
        .status
        .as_deref()
        .map(str::parse::<TransactionStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let transactions = state.transaction_service.list_transactions(status_filter)?;
    Ok(Json(transactions))
}

async fn list_holdings(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Holding>>> {
    require_admin(&identity)?;
    let holdings = HoldingRepository::new(state.pool.clone()).list_all()?;
    Ok(Json(holdings))
}

async fn declare_dividend(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(payload): Json<NewDividend>,
) -> ApiResult<Json<Dividend>> {
    require_admin(&identity)?;
    let dividend = state.dividend_service.declare_dividend(payload)?;
    Ok(Json(dividend))
}

async fn list_dividends(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Dividend>>> {
    require_admin(&identity)?;
    let dividends = state.dividend_service.list_dividends()?;
    Ok(Json(dividends))
}

async fn list_dividend_payouts(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<DividendPayout>>> {
    require_admin(&identity)?;
    let payouts = state.dividend_service.list_payouts(&id)?;
    Ok(Json(payouts))
}

async fn pay_dividend_payout(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<DividendPayout>> {
    require_admin(&identity)?;
    let payout = state.dividend_service.pay_payout(&id)?;
    Ok(Json(payout))
}

async fn delete_dividend(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<StatusCode> {
    require_admin(&identity)?;
    state.dividend_service.delete_dividend(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/active", put(set_user_active))
        .route("/admin/users/{id}", delete(delete_user))
        .route("/admin/transactions", get(list_transactions))
        .route("/admin/holdings", get(list_holdings))
        .route(
            "/admin/dividends",
            get(list_dividends).post(declare_dividend),
        )
        .route("/admin/dividends/{id}", delete(delete_dividend))
        .route("/admin/dividends/{id}/payouts", get(list_dividend_payouts))
        .route("/admin/payouts/{id}/pay", post(pay_dividend_payout))
}
