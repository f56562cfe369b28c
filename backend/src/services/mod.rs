//! Business logic services
//!
//! Services coordinate between the HTTP layer and the stores. Credential
//! flows live in [`AuthService`]; account and post reads and mutations in
//! [`UserService`] and [`PostService`].

pub mod auth;
pub mod post;
pub mod user;

pub use auth::{AuthService, Session};
pub use post::PostService;
pub use user::UserService;

use crate::config::PaginationConfig;
use crate::error::{BlogError, BlogResult};
use crate::repositories::PageRequest;
use blog_shared::types::PageQuery;

/// Turn query parameters into a page request, applying configured defaults
///
/// A page size above the configured maximum is refused rather than clamped.
pub fn resolve_page(query: &PageQuery, policy: &PaginationConfig) -> BlogResult<PageRequest> {
    let request = PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(policy.default_page_size),
    );
    request.validate()?;

    if request.size > policy.max_page_size {
        return Err(BlogError::InvalidPage {
            page: request.index,
            page_size: request.size,
        });
    }

    Ok(request)
}
