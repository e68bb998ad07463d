use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use faltasi_core::transactions::{
    NewTransaction, Transaction, TransactionServiceTrait, TransactionSide,
};

use crate::{
    auth::{require_admin, AuthenticatedUser},
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest {
    offering_id: String,
    shares_count: i64,
    notes: Option<String>,
    method: Option<String>,
}

async fn place_order(
    state: Arc<AppState>,
    identity: AuthenticatedUser,
    side: TransactionSide,
    payload: OrderRequest,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .transaction_service
        .initiate_order(
            NewTransaction {
                user_id: identity.user_id,
                offering_id: payload.offering_id,
                side,
                shares_count: payload.shares_count,
                notes: payload.notes,
            },
            payload.method,
        )
        .await?;
    Ok(Json(transaction))
}

async fn buy(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(payload): Json<OrderRequest>,
) -> ApiResult<Json<Transaction>> {
    place_order(state, identity, TransactionSide::Buy, payload).await
}

async fn sell(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(payload): Json<OrderRequest>,
) -> ApiResult<Json<Transaction>> {
    place_order(state, identity, TransactionSide::Sell, payload).await
}

async fn list_own(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let transactions = state
        .transaction_service
        .list_user_transactions(&identity.user_id)?;
    Ok(Json(transactions))
}

async fn get_one(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state.transaction_service.get_transaction(&id)?;
    if transaction.user_id != identity.user_id && require_admin(&identity).is_err() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(transaction))
}

async fn approve(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Transaction>> {
    require_admin(&identity)?;
    let transaction = state.transaction_service.approve_transaction(&id)?;
    Ok(Json(transaction))
}

async fn reject(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Transaction>> {
    require_admin(&identity)?;
    let transaction = state.transaction_service.reject_transaction(&id)?;
    Ok(Json(transaction))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transactions", get(list_own))
        .route("/transactions/buy", post(buy))
        .route("/transactions/sell", post(sell))
        .route("/transactions/{id}", get(get_one))
        .route("/transactions/{id}/approve", post(approve))
        .route("/transactions/{id}/reject", post(reject))
}
