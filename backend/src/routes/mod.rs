//! Route definitions for the blog API
//!
//! This module organizes all API routes and applies middleware.

use crate::auth::AUTH_TOKEN_HEADER;
use crate::repositories::Page;
use crate::state::AppState;
use axum::{
    http::{header, HeaderName, Method},
    routing::get,
    Router,
};
use blog_shared::types::PaginatedResponse;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod health;
mod posts;
mod users;


pub use auth::auth_routes;
pub use posts::post_routes;
pub use users::user_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    let session_header = HeaderName::from_static(AUTH_TOKEN_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", api_routes())
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, session_header.clone()])
                .expose_headers([session_header]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "Blog API v1" }))
        .merge(auth::auth_routes())
        .nest("/users", users::user_routes())
        .nest("/posts", posts::post_routes())
}

/// Wrap a store page in the wire envelope
fn paginated<T, U>(page: Page<T>, convert: impl FnMut(T) -> U) -> PaginatedResponse<U> {
    let total_pages = page.total_pages();
    let request = page.request;
    let page = page.map(convert);

    PaginatedResponse {
        data: page.items,
        total: page.total,
        page: request.index,
        page_size: request.size,
        total_pages,
    }
}
