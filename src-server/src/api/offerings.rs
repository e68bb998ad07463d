use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use faltasi_core::offerings::{NewOffering, Offering, OfferingServiceTrait, OfferingUpdate};

use crate::{
    auth::{require_admin, AuthenticatedUser},
    error::ApiResult,
    main_lib::AppState,
};

async fn list_offerings(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Offering>>> {
    let offerings = state.offering_service.list_offerings()?;
    Ok(Json(offerings))
}

async fn get_offering(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Offering>> {
    let offering = state.offering_service.get_offering(&id)?;
    Ok(Json(offering))
}

async fn create_offering(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(payload): Json<NewOffering>,
) -> ApiResult<Json<Offering>> {
    require_admin(&identity)?;
    let offering = state.offering_service.create_offering(payload)?;
    Ok(Json(offering))
}

async fn update_offering(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(mut payload): Json<OfferingUpdate>,
) -> ApiResult<Json<Offering>> {
    require_admin(&identity)?;
    payload.id = id;
    let offering = state.offering_service.update_offering(payload)?;
    Ok(Json(offering))
}

async fn delete_offering(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<StatusCode> {
    require_admin(&identity)?;
    state.offering_service.delete_offering(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/offerings", get(list_offerings).post(create_offering))
        .route(
            "/offerings/{id}",
            get(get_offering).put(update_offering).delete(delete_offering),
        )
}
