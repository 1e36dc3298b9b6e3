//! Session gate for protected routes
//!
//! Runs as middleware in front of every note handler. It reads the token from
//! the `Authorization` header, verifies it with the `TokenCodec`, and stores
//! the resolved identity in the request extensions. Handlers receive it by
//! extracting [`Authenticated`]; the gate never touches the record store.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::model::IdentityId;
use crate::AppState;

/// Identity resolved from a verified session token.
///
/// Only the gate creates this, so anything holding one was authorized by a
/// token rather than by client-supplied data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated(IdentityId);

impl Authenticated {
    pub(crate) fn new(id: IdentityId) -> Self {
        Self(id)
    }

    pub fn id(&self) -> IdentityId {
        self.0
    }
}

/// Middleware: reject the request with 401 unless it carries a valid token.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = session_token(request.headers()) else {
        tracing::debug!("No session token present");
        return Err(ApiError::Unauthenticated);
    };

    let identity = match state.codec.verify(token) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("Rejected session token: {}", e);
            return Err(ApiError::Unauthenticated);
        }
    };

    request
        .extensions_mut()
        .insert(Authenticated::new(identity));
    Ok(next.run(request).await)
}

/// Pull the token out of the `Authorization` header.
///
/// Accepts `Bearer <token>` as well as the bare token.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent when a handler is mounted outside the gate.
        parts
            .extensions
            .get::<Authenticated>()
            .copied()
            .ok_or(ApiError::Unauthenticated)
    }
}
