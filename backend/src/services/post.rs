//! Post service
//!
//! The author of a new post is always the admitted identity of the
//! request, never a field supplied by the client.

use crate::error::BlogResult;
use crate::repositories::{ContentStore, NewPost, Page, PageRequest, Post, PostUpdate, Recency};
use blog_shared::types::PostRequest;
use tracing::info;

/// Post service for content management
pub struct PostService;

impl PostService {
    /// Publish a post as `author`
    pub async fn create(
        store: &dyn ContentStore,
        handle: &str,
        input: PostRequest,
        author: &str,
    ) -> BlogResult<Post> {
        let post = NewPost {
            handle: handle.to_string(),
            title: input.title,
            summary: input.summary,
            body: input.body,
        };

        let created = store.create(post, author).await?;
        info!(handle, author, "post created");
        Ok(created)
    }

    pub async fn get(store: &dyn ContentStore, handle: &str) -> BlogResult<Post> {
        store.fetch(handle).await
    }

    /// Newest posts first
    pub async fn list(store: &dyn ContentStore, page: PageRequest) -> BlogResult<Page<Post>> {
        store.fetch_page(page, Recency::NewestFirst).await
    }

    /// Apply the fields present in `input`
    pub async fn update(
        store: &dyn ContentStore,
        handle: &str,
        input: PostRequest,
        requested_by: &str,
    ) -> BlogResult<Post> {
        let update = PostUpdate {
            title: input.title,
            summary: input.summary,
            body: input.body,
        };

        let updated = store.update(handle, update).await?;
        info!(handle, requested_by, "post updated");
        Ok(updated)
    }

    pub async fn delete(store: &dyn ContentStore, handle: &str, requested_by: &str) -> BlogResult<()> {
        store.delete(handle).await?;
        info!(handle, requested_by, "post deleted");
        Ok(())
    }
}
