//! `POST /register` and `POST /login`

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JsonBody;
use crate::error::ApiError;
use crate::model::IdentitySummary;
use crate::AppState;

/// Credentials submitted to register and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: IdentitySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: IdentitySummary,
}

/// Handler for `POST /register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .accounts
        .register(&request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            user,
        }),
    ))
}

/// Handler for `POST /login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .accounts
        .authenticate(&request.email, &request.password)
        .await?;

    let issued = state
        .codec
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_at: issued.expires_at,
        user,
    }))
}
