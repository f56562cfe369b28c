//! Password hashing using bcrypt
//!
//! Provides salted hashing and verification of account passwords.
//!
//! # Performance Considerations
//!
//! bcrypt is intentionally CPU-intensive. In async contexts use the
//! `*_async` variants, which run on the blocking thread pool.

use thiserror::Error;
use tracing::warn;

/// bcrypt only consumes the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Cost used when none is configured
pub const DEFAULT_COST: u32 = 10;

/// Password hashing failures
///
/// Only hashing can fail; verification folds every problem into `false`.
#[derive(Error, Debug)]
pub enum HashingError {
    #[error("password is {len} bytes, the hashing limit is {max} bytes")]
    InputTooLong { len: usize, max: usize },

    #[error("failed to hash password: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Password hashing service
///
/// Every call to [`PasswordService::hash`] draws a fresh random salt, so
/// two digests of the same password never match byte-for-byte.
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password (blocking operation)
    ///
    /// Input longer than [`MAX_PASSWORD_BYTES`] is rejected instead of being
    /// silently truncated.
    pub fn hash(&self, password: &str) -> Result<String, HashingError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(HashingError::InputTooLong {
                len: password.len(),
                max: MAX_PASSWORD_BYTES,
            });
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(&self, password: String) -> Result<String, HashingError> {
        let service = *self;
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| HashingError::Task(e.to_string()))?
    }

    /// Verify a password against a stored digest (blocking operation)
    ///
    /// A malformed digest is indistinguishable from a mismatch. The digest
    /// comparison inside bcrypt is constant-time. Input over
    /// `MAX_PASSWORD_BYTES` never verifies, since bcrypt would only compare
    /// its first 72 bytes.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        bcrypt::verify(password, digest).unwrap_or(false)
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(&self, password: String, digest: String) -> bool {
        let service = *self;
        match tokio::task::spawn_blocking(move || service.verify(&password, &digest)).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("password verification task failed: {}", e);
                false
            }
        }
    }
}
