//! Session token issuance and verification
//!
//! Session credentials are HS256-signed JWTs carrying the account handle as
//! `sub`, plus `iat` and `exp`. The lifetime is fixed at 24 hours and there
//! is no refresh path; a token simply stops verifying once it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Fixed session lifetime
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// The only accepted signing algorithm
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account handle)
    #[serde(default)]
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Reasons a session token is refused
///
/// Callers outside the auth layer see all of these as one "invalid or
/// expired" outcome; the variants exist for logging and tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("token uses an unexpected signing algorithm")]
    UnexpectedAlgorithm,

    #[error("token has no subject claim")]
    MissingSubject,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to issue token: {0}")]
    Issue(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnexpectedAlgorithm
            }
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => TokenError::MissingSubject,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Pre-computed JWT keys
///
/// Derived once from the process-wide secret and shared behind `Arc`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

/// Session token service
///
/// Built once at startup from the configured secret. There is no way to
/// swap the secret afterwards; doing so would invalidate every token.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    validation: Arc<Validation>,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys: JwtKeys::new(secret),
            validation: Arc::new(validation),
        }
    }

    /// Issue a session token for an account handle
    pub fn issue(&self, handle: &str) -> Result<String, TokenError> {
        self.issue_at(handle, Utc::now())
    }

    fn issue_at(&self, handle: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = now + Duration::hours(SESSION_LIFETIME_HOURS);
        let claims = Claims {
            sub: handle.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, self.keys.encoding())
            .map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verify a token and return its claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, self.keys.decoding(), &self.validation)?;
        if token_data.claims.sub.is_empty() {
            return Err(TokenError::MissingSubject);
        }
        Ok(token_data.claims)
    }

    /// Verify a token and return the account handle it was issued for
    #[inline]
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.decode_claims(token).map(|claims| claims.sub)
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn lifetime_secs(&self) -> i64 {
        SESSION_LIFETIME_HOURS * 3600
    }
}
