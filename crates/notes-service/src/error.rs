//! Error taxonomy exposed to clients.
//!
//! Components resolve their own failures into an `ApiError` before anything
//! reaches the HTTP layer; `IntoResponse` below is the only place a status
//! code is chosen.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing input fields
    #[error("{0}")]
    Validation(String),

    /// Duplicate email on registration
    #[error("{0}")]
    Conflict(String),

    /// Wrong email or password at login
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, invalid or expired session token
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Note absent or owned by someone else
    #[error("Not found")]
    NotFound,

    /// Store or unexpected failure; the detail is only logged
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorBody { error: message });

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EmailTaken(_) => ApiError::Conflict("Email already registered".to_string()),
            // A verified token naming an identity the store does not know.
            StoreError::UnknownOwner(_) => ApiError::Unauthenticated,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
