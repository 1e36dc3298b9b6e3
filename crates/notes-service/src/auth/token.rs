//! Stateless session tokens.
//!
//! A token is `base64url(claims) "." base64url(HMAC-SHA256(key, first segment))`.
//! Nothing is stored server-side: a token is valid as long as its MAC checks
//! out under the process signing key and its expiry has not passed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{digest::InvalidLength, Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::model::IdentityId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    Invalid,

    #[error("Token has expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Token expiry is out of range")]
    OutOfRange,

    #[error("Failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Payload carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity the token was issued to
    pub sub: IdentityId,
    /// Issue time (unix seconds)
    pub iat: i64,
    /// Expiry time (unix seconds)
    pub exp: i64,
}

/// A freshly issued token and when it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens with an injected signing key.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(signing_key: &[u8], ttl: Duration) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(signing_key)?,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: IdentityId) -> Result<IssuedToken, IssueError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// The expiry is truncated to whole seconds so it matches the `exp` claim.
    pub fn issue_at(
        &self,
        identity: IdentityId,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, IssueError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .and_then(|t| DateTime::from_timestamp(t.timestamp(), 0))
            .ok_or(IssueError::OutOfRange)?;
        let claims = SessionClaims {
            sub: identity,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));

        Ok(IssuedToken {
            token: format!("{}.{}", payload, signature),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<IdentityId, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// The MAC is checked before any claim is decoded.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityId, TokenError> {
        let (payload, signature) = split_token(token)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Invalid)?;
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;
        if now > expires_at {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Split into (payload, signature); both must be non-empty base64url text.
fn split_token(token: &str) -> Result<(&str, &str), TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let well_formed = |s: &str| {
        !s.is_empty()
            && s.bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    };
    if !well_formed(payload) || !well_formed(signature) {
        return Err(TokenError::Malformed);
    }
    Ok((payload, signature))
}
