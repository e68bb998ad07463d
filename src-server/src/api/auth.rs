use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use faltasi_core::users::{NewUser, User, UserError, UserRole, UserServiceTrait};

use crate::{
    auth::{AuthenticatedUser, TokenPair},
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    phone: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    phone: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<User>> {
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = state.auth.hash_password(&payload.password)?;
    let user = state.user_service.register_user(NewUser {
        name: payload.name,
        phone: payload.phone,
        password_hash,
        role: UserRole::Investor,
    })?;
    Ok(Json(user))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let user = state
        .user_service
        .get_user_by_phone(&payload.phone)
        .map_err(|e| match e {
            UserError::NotFound(_) => ApiError::Unauthorized("Invalid credentials".to_string()),
            other => ApiError::from(other),
        })?;

    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "Account is deactivated".to_string(),
        ));
    }

    state
        .auth
        .verify_password(&user.password_hash, &payload.password)?;
    let tokens = state.auth.issue_token_pair(&user)?;
    Ok(Json(tokens))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let identity = state.auth.authenticate_refresh(&payload.refresh_token)?;

    let user = state
        .user_service
        .get_user(&identity.user_id)
        .map_err(|e| match e {
            UserError::NotFound(_) => ApiError::Unauthorized("Unauthorized".to_string()),
            other => ApiError::from(other),
        })?;
    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "Account is deactivated".to_string(),
        ));
    }

    let tokens = state.auth.issue_token_pair(&user)?;
    Ok(Json(tokens))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let user = state.user_service.get_user(&identity.user_id)?;
    state
        .auth
        .verify_password(&user.password_hash, &payload.current_password)?;

    let new_hash = state.auth.hash_password(&payload.new_password)?;
    state.user_service.update_password(&user.id, &new_hash)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> ApiResult<Json<User>> {
    let user = state.user_service.get_user(&identity.user_id)?;
    Ok(Json(user))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
}
