//! Personal notes API with password login and owner-scoped access
//!
//! Provides:
//! - Registration and login with Argon2id password hashes
//! - Stateless HMAC-signed session tokens
//! - A session gate in front of every note route
//! - Note CRUD where every query is filtered by the caller's identity

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod model;
pub mod notes;
pub mod routes;
pub mod storage;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::accounts::Accounts;
use crate::auth::{PasswordHasher, TokenCodec};
use crate::config::Config;
use crate::notes::OwnedNotes;
use crate::storage::JsonStore;

/// Shared application state
pub struct AppState {
    pub codec: TokenCodec,
    pub accounts: Accounts,
    pub notes: OwnedNotes,
}

impl AppState {
    /// Wire the components together around a single record store.
    pub fn new(config: &Config, signing_key: &[u8], store: Arc<JsonStore>) -> Result<Self> {
        let codec = TokenCodec::new(signing_key, config.token_lifetime()?)
            .map_err(|e| anyhow!("Invalid signing key: {}", e))?;
        let hasher = PasswordHasher::new(&config.password)?;
        let accounts = Accounts::new(store.clone(), hasher)?;
        let notes = OwnedNotes::new(store);

        Ok(Self {
            codec,
            accounts,
            notes,
        })
    }
}

/// Build the HTTP router: public account routes plus gated note routes.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/notes", get(routes::notes::list).post(routes::notes::create))
        .route(
            "/notes/{id}",
            get(routes::notes::get)
                .put(routes::notes::update)
                .delete(routes::notes::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/register", post(routes::accounts::register))
        .route("/login", post(routes::accounts::login))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
