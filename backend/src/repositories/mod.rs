//! Database repositories
//!
//! Persistence contracts for accounts ([`AccountStore`]) and posts
//! ([`ContentStore`]), with a PostgreSQL implementation of each and an
//! in-memory implementation of both.
//!
//! Uniqueness of handles is enforced by the storage layer itself (a unique
//! constraint, or a single write lock in memory). Nothing here checks for a
//! duplicate before inserting.

pub mod memory;
pub mod post;
pub mod user;

pub use memory::InMemoryStore;
pub use post::PgContentStore;
pub use user::PgAccountStore;

use crate::error::{BlogError, BlogResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Account record
#[derive(Clone, sqlx::FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub handle: String,
    pub credential_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("credential_digest", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Post record with its author's handle resolved
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub handle: String,
    pub author: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub handle: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
}

/// Partial update of a post; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
}

/// Post listing order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recency {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: i64,
    pub size: i64,
}

impl PageRequest {
    pub fn new(index: i64, size: i64) -> Self {
        Self { index, size }
    }

    fn invalid(&self) -> BlogError {
        BlogError::InvalidPage {
            page: self.index,
            page_size: self.size,
        }
    }

    /// Reject non-positive page indices and sizes
    pub fn validate(&self) -> BlogResult<()> {
        if self.index < 1 || self.size < 1 {
            return Err(self.invalid());
        }
        Ok(())
    }

    /// Reject pages past the last one. Page 1 of an empty collection is valid.
    pub fn ensure_within(&self, total: i64) -> BlogResult<()> {
        let last = page_count(total, self.size).max(1);
        if self.index > last {
            return Err(self.invalid());
        }
        Ok(())
    }

    /// Row offset of the first item; only meaningful after validation
    pub fn offset(&self) -> i64 {
        (self.index - 1) * self.size
    }
}

/// Number of pages needed for `total` items
pub fn page_count(total: i64, size: i64) -> i64 {
    if size <= 0 || total <= 0 {
        return 0;
    }
    total / size + i64::from(total % size != 0)
}

/// One page of results plus the size of the whole collection
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        page_count(self.total, self.request.size)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

/// Account persistence
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. A taken handle yields `DuplicateIdentity`.
    async fn create(&self, handle: &str, credential_digest: &str) -> BlogResult<Identity>;

    async fn fetch(&self, handle: &str) -> BlogResult<Identity>;

    /// Accounts in creation order
    async fn fetch_page(&self, page: PageRequest) -> BlogResult<Page<Identity>>;

    async fn update_credential(&self, handle: &str, credential_digest: &str)
        -> BlogResult<Identity>;

    /// Remove an account and every post it authored. Not idempotent.
    async fn delete(&self, handle: &str) -> BlogResult<()>;

    async fn health_check(&self) -> BlogResult<()>;
}

/// Post persistence
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert a post for an existing author. A taken handle yields
    /// `DuplicateItem`, an unknown author `IdentityNotFound`.
    async fn create(&self, post: NewPost, author: &str) -> BlogResult<Post>;

    async fn fetch(&self, handle: &str) -> BlogResult<Post>;

    async fn fetch_page(&self, page: PageRequest, order: Recency) -> BlogResult<Page<Post>>;

    async fn update(&self, handle: &str, update: PostUpdate) -> BlogResult<Post>;

    async fn delete(&self, handle: &str) -> BlogResult<()>;
}

/// Unique-constraint violation, read from the structured database error
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Foreign-key violation, read from the structured database error
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
