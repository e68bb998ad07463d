use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use faltasi_core::dividends::DividendError;
use faltasi_core::errors::Error as CoreError;
use faltasi_core::offerings::OfferingError;
use faltasi_core::payments::PaymentError;
use faltasi_core::transactions::TransactionError;
use faltasi_core::users::UserError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::User(e) => match e {
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            UserError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        },
        CoreError::Offering(e) => match e {
            OfferingError::NotFound(_) => StatusCode::NOT_FOUND,
            OfferingError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        },
        CoreError::Holding(e) => match e {
            faltasi_core::holdings::HoldingError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        CoreError::Transaction(e) => match e {
            TransactionError::NotFound(_) => StatusCode::NOT_FOUND,
            TransactionError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TransactionError::GatewayUnreachable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        },
        CoreError::Payment(e) => match e {
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentError::GatewayUnreachable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        },
        CoreError::Dividend(e) => match e {
            DividendError::NotFound(_) => StatusCode::NOT_FOUND,
            DividendError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        },
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::Core(e) => (core_status(e), e.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ApiError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
            ApiError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.clone()),
            ApiError::Internal(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason.clone()),
            ApiError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", msg);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::Unauthorized => {
                ApiError::Unauthorized("Unauthorized".to_string())
            }
            crate::auth::AuthError::Forbidden => {
                ApiError::Forbidden("Admin access required".to_string())
            }
            crate::auth::AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            crate::auth::AuthError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        ApiError::Core(CoreError::User(err))
    }
}

impl From<OfferingError> for ApiError {
    fn from(err: OfferingError) -> Self {
        ApiError::Core(CoreError::Offering(err))
    }
}

impl From<faltasi_core::holdings::HoldingError> for ApiError {
    fn from(err: faltasi_core::holdings::HoldingError) -> Self {
        ApiError::Core(CoreError::Holding(err))
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        ApiError::Core(CoreError::Transaction(err))
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Core(CoreError::Payment(err))
    }
}

impl From<DividendError> for ApiError {
    fn from(err: DividendError) -> Self {
        ApiError::Core(CoreError::Dividend(err))
    }
}
