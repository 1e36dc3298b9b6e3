//! Registration and credential checks.
//!
//! Sits between the HTTP handlers and the credential store: normalizes and
//! validates input, hashes passwords off the async executor, and turns
//! lookup/verify outcomes into the client-facing error taxonomy.

use std::sync::Arc;

use crate::auth::PasswordHasher;
use crate::error::ApiError;
use crate::model::IdentitySummary;
use crate::storage::IdentityStore;

/// Password used to build the decoy hash for unknown emails
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

pub struct Accounts {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    /// Verified against when an email is unknown, so that path costs the
    /// same as a wrong password
    decoy_hash: String,
}

impl Accounts {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: PasswordHasher) -> Result<Self, ApiError> {
        let decoy_hash = hasher
            .hash(DECOY_PASSWORD)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self {
            store,
            hasher,
            decoy_hash,
        })
    }

    /// Create a new identity. Fails with `Conflict` if the email exists.
    pub async fn register(&self, email: &str, password: &str) -> Result<IdentitySummary, ApiError> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let identity = self.store.register(&email, password_hash).await?;
        tracing::info!("Registered identity {}", identity.id);
        Ok(identity.summary())
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password both fail with `InvalidCredentials`.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySummary, ApiError> {
        let Ok(email) = normalize_email(email) else {
            return Err(ApiError::InvalidCredentials);
        };

        let identity = self.store.find_by_email(&email).await?;
        let stored_hash = identity
            .as_ref()
            .map(|i| i.password_hash.clone())
            .unwrap_or_else(|| self.decoy_hash.clone());

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| ApiError::Internal(format!("Verification task failed: {}", e)))?;

        match identity {
            Some(identity) if matches => {
                tracing::info!("Identity {} logged in", identity.id);
                Ok(identity.summary())
            }
            _ => {
                tracing::debug!("Login rejected");
                Err(ApiError::InvalidCredentials)
            }
        }
    }
}

/// Trim and lowercase an email, rejecting anything without `local@domain`.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    Ok(email)
}
