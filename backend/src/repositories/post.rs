//! PostgreSQL content store

use super::{
    is_foreign_key_violation, is_unique_violation, ContentStore, NewPost, Page, PageRequest,
    Post, PostUpdate, Recency,
};
use crate::error::{BlogError, BlogResult};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

/// Content store backed by the `posts` table, joined with `users` for the
/// author handle
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn create(&self, post: NewPost, author: &str) -> BlogResult<Post> {
        // Zero rows inserted means the author does not exist
        let result = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (handle, author_id, title, summary, body)
                SELECT $1, u.id, $3, $4, $5
                FROM users u
                WHERE u.handle = $2
                RETURNING handle, author_id, title, summary, body, created_at, updated_at
            )
            SELECT i.handle, u.handle AS author, i.title, i.summary, i.body,
                   i.created_at, i.updated_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(&post.handle)
        .bind(author)
        .bind(&post.title)
        .bind(&post.summary)
        .bind(&post.body)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(created)) => {
                debug!(handle = %created.handle, author, "created post");
                Ok(created)
            }
            Ok(None) => Err(BlogError::IdentityNotFound(author.to_string())),
            Err(err) if is_unique_violation(&err) => {
                debug!(handle = %post.handle, "failed to create post, duplicate key");
                Err(BlogError::DuplicateItem(post.handle))
            }
            Err(err) if is_foreign_key_violation(&err) => {
                Err(BlogError::IdentityNotFound(author.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch(&self, handle: &str) -> BlogResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.handle, u.handle AS author, p.title, p.summary, p.body,
                   p.created_at, p.updated_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BlogError::ItemNotFound(handle.to_string()))
    }

    async fn fetch_page(&self, page: PageRequest, order: Recency) -> BlogResult<Page<Post>> {
        page.validate()?;

        let query = match order {
            Recency::NewestFirst => {
                r#"
                SELECT p.handle, u.handle AS author, p.title, p.summary, p.body,
                       p.created_at, p.updated_at
                FROM posts p
                JOIN users u ON u.id = p.author_id
                ORDER BY p.created_at DESC, p.handle DESC
                LIMIT $1 OFFSET $2
                "#
            }
            Recency::OldestFirst => {
                r#"
                SELECT p.handle, u.handle AS author, p.title, p.summary, p.body,
                       p.created_at, p.updated_at
                FROM posts p
                JOIN users u ON u.id = p.author_id
                ORDER BY p.created_at ASC, p.handle ASC
                LIMIT $1 OFFSET $2
                "#
            }
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&mut *tx)
            .await?;
        page.ensure_within(total)?;

        let items = sqlx::query_as::<_, Post>(query)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(page = page.index, count = items.len(), total, "fetched posts");
        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn update(&self, handle: &str, update: PostUpdate) -> BlogResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE posts SET
                    title = COALESCE($2, title),
                    summary = COALESCE($3, summary),
                    body = COALESCE($4, body),
                    updated_at = NOW()
                WHERE handle = $1
                RETURNING handle, author_id, title, summary, body, created_at, updated_at
            )
            SELECT p.handle, u.handle AS author, p.title, p.summary, p.body,
                   p.created_at, p.updated_at
            FROM updated p
            JOIN users u ON u.id = p.author_id
            "#,
        )
        .bind(handle)
        .bind(update.title)
        .bind(update.summary)
        .bind(update.body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BlogError::ItemNotFound(handle.to_string()))?;

        debug!(handle, "updated post");
        Ok(post)
    }

    async fn delete(&self, handle: &str) -> BlogResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE handle = $1")
            .bind(handle)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BlogError::ItemNotFound(handle.to_string()));
        }

        debug!(handle, "deleted post");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require database - see tests/store_integration_test.rs
}
