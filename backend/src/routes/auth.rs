//! Session routes
//!
//! `POST /login` exchanges a user name and password for a session token.
//! The token comes back in the `X-Auth-Token` response header and in the
//! JSON body; clients send it back in the same header.

use super::users::to_user_response;
use crate::auth::{AuthUser, AUTH_TOKEN_HEADER};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use blog_shared::types::{LoginRequest, SessionResponse, UserResponse};
use validator::Validate;

/// Create session routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(current_user))
}

/// POST /api/v1/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<([(&'static str, String); 1], Json<SessionResponse>)> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let session = state.auth().login(&req.user_name, &req.password).await?;

    Ok((
        [(AUTH_TOKEN_HEADER, session.token.clone())],
        Json(SessionResponse {
            token: session.token,
            token_type: "Bearer".to_string(),
            expires_in: session.expires_in,
        }),
    ))
}

/// GET /api/v1/me
async fn current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let identity = state.accounts().fetch(&auth_user.handle).await?;
    Ok(Json(to_user_response(identity)))
}
