//! Post routes

use super::paginated;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::repositories::Post;
use crate::services::{resolve_page, PostService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use blog_shared::types::{PageQuery, PaginatedResponse, PostMetadata, PostRequest, PostResponse};
use blog_shared::validation::validate_url_handle;
use validator::Validate;

/// Create post routes
pub fn post_routes() -> Router<AppState> {
    Router::new().route("/", get(list_posts)).route(
        "/:handle",
        get(get_post)
            .post(create_post)
            .put(update_post)
            .delete(delete_post),
    )
}

fn to_post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.handle,
        author: post.author,
        title: post.title,
        summary: post.summary,
        body: post.body,
        creation_time: post.created_at,
        update_time: post.updated_at,
    }
}

fn to_post_metadata(post: Post) -> PostMetadata {
    PostMetadata {
        id: post.handle,
        author: post.author,
        title: post.title,
        summary: post.summary,
        creation_time: post.created_at,
    }
}

/// GET /api/v1/posts?page=1&pageSize=10 - newest first
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResponse<PostMetadata>>> {
    let page = resolve_page(&query, &state.config().pagination)?;
    let posts = PostService::list(state.posts(), page).await?;
    Ok(Json(paginated(posts, to_post_metadata)))
}

/// GET /api/v1/posts/:handle
async fn get_post(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<PostResponse>> {
    let post = PostService::get(state.posts(), &handle).await?;
    Ok(Json(to_post_response(post)))
}

/// POST /api/v1/posts/:handle - the session's user becomes the author
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(handle): Path<String>,
    Json(req): Json<PostRequest>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    validate_url_handle(&handle).map_err(ApiError::Validation)?;
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let post = PostService::create(state.posts(), &handle, req, &auth.handle).await?;
    Ok((StatusCode::CREATED, Json(to_post_response(post))))
}

/// PUT /api/v1/posts/:handle
async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(handle): Path<String>,
    Json(req): Json<PostRequest>,
) -> ApiResult<Json<PostResponse>> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let post = PostService::update(state.posts(), &handle, req, &auth.handle).await?;
    Ok(Json(to_post_response(post)))
}

/// DELETE /api/v1/posts/:handle
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(handle): Path<String>,
) -> ApiResult<StatusCode> {
    PostService::delete(state.posts(), &handle, &auth.handle).await?;
    Ok(StatusCode::NO_CONTENT)
}
