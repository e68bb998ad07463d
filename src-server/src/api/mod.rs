use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{auth::require_auth, config::Config, main_lib::AppState};

pub mod admin;
pub mod auth;
pub mod health;
pub mod offerings;
pub mod payments;
pub mod portfolio;
pub mod transactions;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let public = Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(payments::callback_router());

    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(offerings::router())
        .merge(transactions::router())
        .merge(payments::router())
        .merge(portfolio::router())
        .merge(admin::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api/v1", public.merge(protected))
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
