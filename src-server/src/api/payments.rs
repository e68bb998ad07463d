use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use faltasi_core::payments::{CallbackOutcome, CallbackPayload, Payment};

use crate::{auth::AuthenticatedUser, error::ApiResult, main_lib::AppState};

async fn list_own(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = state.payment_service.list_user_payments(&identity.user_id)?;
    Ok(Json(payments))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallbackResponse {
    acknowledged: bool,
    outcome: String,
}

/// Provider-facing endpoint. Always acknowledges so the provider stops
/// retrying; unmatched or repeated callbacks change nothing.
async fn callback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CallbackPayload>,
) -> ApiResult<Json<CallbackResponse>> {
    let outcome = state.payment_service.handle_callback(&payload)?;
    let outcome = match outcome {
        CallbackOutcome::Settled => "settled",
        CallbackOutcome::Failed => "failed",
        CallbackOutcome::Duplicate => "duplicate",
        CallbackOutcome::Unmatched => "unmatched",
        CallbackOutcome::Ignored => "ignored",
    };
    Ok(Json(CallbackResponse {
        acknowledged: true,
        outcome: outcome.to_string(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/payments", get(list_own))
}

pub fn callback_router() -> Router<Arc<AppState>> {
    Router::new().route("/payments/callback", post(callback))
}
