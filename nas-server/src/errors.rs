//! HTTP error mapping, grounded in the teacher's
//! `ferrex-server::infra::errors::AppError`: a status code plus message,
//! serialized the same way, with `From` impls bridging collaborator error
//! types at the handler boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

use nas_core::CoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));
        (self.status, body).into_response()
    }
}

/// Maps the bounded core error set (spec.md §7) onto HTTP status codes.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::Auth(_) => StatusCode::UNAUTHORIZED,
            CoreError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CoreError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::ScanBusy => StatusCode::CONFLICT,
            CoreError::NoSources => StatusCode::BAD_REQUEST,
            CoreError::DuplicateSource(_) => StatusCode::CONFLICT,
            CoreError::KeyLost => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            CoreError::Io(_) | CoreError::Database(_) | CoreError::Pool(_) | CoreError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "internal error");
        }
        Self::new(status, err.to_string())
    }
}
