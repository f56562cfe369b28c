//! Request-boundary access guard
//!
//! Every protected request goes through [`authorize`]:
//! no `X-Auth-Token` header means `MissingCredential`; a header whose token
//! fails verification means `InvalidOrExpiredCredential`; otherwise the
//! request is admitted and the resolved handle travels with it as
//! [`AuthUser`]. A single bad token ends the request, there are no retries.

use super::jwt::{JwtService, TokenError};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{request::Parts, HeaderMap},
};
use thiserror::Error;
use tracing::debug;

/// Header carrying the session credential, on requests and on login responses
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Why a request was not admitted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("auth token is missing")]
    MissingCredential,

    #[error("auth token expired or invalid")]
    InvalidOrExpiredCredential(TokenError),
}

/// Identity admitted by the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub handle: String,
}

/// Run the guard against a set of request headers
pub fn authorize(headers: &HeaderMap, jwt: &JwtService) -> Result<AuthUser, GuardRejection> {
    let token = headers
        .get(AUTH_TOKEN_HEADER)
        .map(|value| value.to_str().map(str::trim))
        .ok_or(GuardRejection::MissingCredential)?
        .map_err(|_| {
            GuardRejection::InvalidOrExpiredCredential(TokenError::Malformed(
                "header is not valid ASCII".to_string(),
            ))
        })?;

    if token.is_empty() {
        return Err(GuardRejection::MissingCredential);
    }

    match jwt.verify(token) {
        Ok(handle) => Ok(AuthUser { handle }),
        Err(reason) => {
            debug!(%reason, "rejecting request with invalid session token");
            Err(GuardRejection::InvalidOrExpiredCredential(reason))
        }
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = authorize(&parts.headers, app_state.jwt())?;

        // Later extractors and layers see the same identity
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn jwt() -> JwtService {
        JwtService::new("test-secret-key-for-testing-only-32chars")
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_rejected() {
        let result = authorize(&HeaderMap::new(), &jwt());
        assert_eq!(result, Err(GuardRejection::MissingCredential));
    }

    #[test]
    fn test_blank_header_rejected_as_missing() {
        let result = authorize(&headers_with("   "), &jwt());
        assert_eq!(result, Err(GuardRejection::MissingCredential));
    }

    #[test]
    fn test_valid_token_admitted() {
        let service = jwt();
        let token = service.issue("alice").unwrap();
        let user = authorize(&headers_with(&token), &service).unwrap();
        assert_eq!(user.handle, "alice");
    }

    #[test]
    fn test_authorization_header_is_not_consulted() {
        let service = jwt();
        let token = service.issue("alice").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(
            authorize(&headers, &service),
            Err(GuardRejection::MissingCredential)
        );
    }

    #[test]
    fn test_foreign_token_rejected_with_reason() {
        let foreign = JwtService::new("some-other-secret").issue("alice").unwrap();
        assert_eq!(
            authorize(&headers_with(&foreign), &jwt()),
            Err(GuardRejection::InvalidOrExpiredCredential(
                TokenError::InvalidSignature
            ))
        );
    }

    #[test]
    fn test_rejections_display_uniformly() {
        let expired = GuardRejection::InvalidOrExpiredCredential(TokenError::Expired);
        let forged = GuardRejection::InvalidOrExpiredCredential(TokenError::InvalidSignature);
        assert_eq!(expired.to_string(), forged.to_string());
    }

    proptest! {
        #[test]
        fn prop_random_tokens_never_admitted(token in "[a-zA-Z0-9_.-]{1,80}") {
            let result = authorize(&headers_with(&token), &jwt());
            let rejected = matches!(result, Err(GuardRejection::InvalidOrExpiredCredential(_)));
            prop_assert!(rejected);
        }
    }
}
