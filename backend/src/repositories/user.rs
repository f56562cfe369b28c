//! PostgreSQL account store

use super::{is_unique_violation, AccountStore, Identity, Page, PageRequest};
use crate::db;
use crate::error::{BlogError, BlogResult};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

/// Account store backed by the `users` table
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, handle: &str, credential_digest: &str) -> BlogResult<Identity> {
        let result = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO users (handle, credential_digest)
            VALUES ($1, $2)
            RETURNING id, handle, credential_digest, created_at, updated_at
            "#,
        )
        .bind(handle)
        .bind(credential_digest)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(identity) => {
                debug!(handle, "created user");
                Ok(identity)
            }
            Err(err) if is_unique_violation(&err) => {
                debug!(handle, "failed to create user, duplicate key");
                Err(BlogError::DuplicateIdentity(handle.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch(&self, handle: &str) -> BlogResult<Identity> {
        sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, handle, credential_digest, created_at, updated_at
            FROM users
            WHERE handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BlogError::IdentityNotFound(handle.to_string()))
    }

    async fn fetch_page(&self, page: PageRequest) -> BlogResult<Page<Identity>> {
        page.validate()?;

        // Count and rows come from one snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *tx)
            .await?;
        page.ensure_within(total)?;

        let items = sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, handle, credential_digest, created_at, updated_at
            FROM users
            ORDER BY created_at ASC, handle ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(page = page.index, count = items.len(), total, "fetched users");
        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn update_credential(
        &self,
        handle: &str,
        credential_digest: &str,
    ) -> BlogResult<Identity> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            UPDATE users SET
                credential_digest = $2,
                updated_at = NOW()
            WHERE handle = $1
            RETURNING id, handle, credential_digest, created_at, updated_at
            "#,
        )
        .bind(handle)
        .bind(credential_digest)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BlogError::IdentityNotFound(handle.to_string()))?;

        debug!(handle, "updated user credential");
        Ok(identity)
    }

    async fn delete(&self, handle: &str) -> BlogResult<()> {
        // Authored posts go with the user (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM users WHERE handle = $1")
            .bind(handle)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BlogError::IdentityNotFound(handle.to_string()));
        }

        debug!(handle, "deleted user");
        Ok(())
    }

    async fn health_check(&self) -> BlogResult<()> {
        Ok(db::health_check(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    // Integration tests require database - see tests/store_integration_test.rs
}
