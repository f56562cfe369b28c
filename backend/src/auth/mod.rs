//! Authentication module
//!
//! Credential hashing (bcrypt), session tokens (HS256 JWT) and the
//! request guard that admits or rejects protected requests.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService, TokenError, SESSION_LIFETIME_HOURS};
pub use middleware::{authorize, AuthUser, GuardRejection, AUTH_TOKEN_HEADER};
pub use password::{HashingError, PasswordService, DEFAULT_COST, MAX_PASSWORD_BYTES};
