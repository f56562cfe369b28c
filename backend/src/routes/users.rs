//! Account routes

use super::paginated;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::repositories::Identity;
use crate::services::{resolve_page, UserService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use blog_shared::types::{
    ChangePasswordRequest, PageQuery, PaginatedResponse, RegisterRequest, UserResponse,
};
use blog_shared::validation::{validate_password, validate_user_name};
use validator::Validate;

/// Create account routes
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/", get(list_users)).route(
        "/:handle",
        get(get_user)
            .post(register_user)
            .put(change_password)
            .delete(delete_user),
    )
}

pub(super) fn to_user_response(identity: Identity) -> UserResponse {
    UserResponse {
        user_name: identity.handle,
        created_at: identity.created_at,
        updated_at: identity.updated_at,
    }
}

/// GET /api/v1/users?page=1&pageSize=10
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResponse<UserResponse>>> {
    let page = resolve_page(&query, &state.config().pagination)?;
    let users = UserService::list(state.accounts(), page).await?;
    Ok(Json(paginated(users, to_user_response)))
}

/// GET /api/v1/users/:handle
async fn get_user(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let identity = UserService::get(state.accounts(), &handle).await?;
    Ok(Json(to_user_response(identity)))
}

/// POST /api/v1/users/:handle
///
/// Only an admitted session may create accounts.
async fn register_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(handle): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    validate_user_name(&handle).map_err(ApiError::Validation)?;
    validate_password(&req.password).map_err(ApiError::Validation)?;

    let identity = state.auth().register(&handle, &req.password).await?;
    Ok((StatusCode::CREATED, Json(to_user_response(identity))))
}

/// PUT /api/v1/users/:handle
///
/// The current password must be supplied alongside the new one.
async fn change_password(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(handle): Path<String>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let identity = state
        .auth()
        .change_credential(&handle, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(to_user_response(identity)))
}

/// DELETE /api/v1/users/:handle
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(handle): Path<String>,
) -> ApiResult<StatusCode> {
    UserService::delete(state.accounts(), &handle, &auth.handle).await?;
    Ok(StatusCode::NO_CONTENT)
}
