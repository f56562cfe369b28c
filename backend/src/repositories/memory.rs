//! In-memory store
//!
//! Implements both [`AccountStore`] and [`ContentStore`] over one lock, so
//! a user delete and the removal of that user's posts happen atomically.
//! Used by unit tests and by the server when no database is configured.

use super::{
    AccountStore, ContentStore, Identity, NewPost, Page, PageRequest, Post, PostUpdate, Recency,
};
use crate::error::{BlogError, BlogResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Insertion sequence, used to break creation-time ties
#[derive(Debug, Clone)]
struct Stored<T> {
    seq: u64,
    record: T,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, Stored<Identity>>,
    posts: HashMap<String, Stored<Post>>,
    next_seq: u64,
}

impl MemoryState {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn paginate<T: Clone>(sorted: Vec<&Stored<T>>, page: PageRequest) -> BlogResult<Page<T>> {
    page.validate()?;
    let total = sorted.len() as i64;
    page.ensure_within(total)?;

    let items = sorted
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.size as usize)
        .map(|stored| stored.record.clone())
        .collect();

    Ok(Page {
        items,
        total,
        request: page,
    })
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create(&self, handle: &str, credential_digest: &str) -> BlogResult<Identity> {
        let mut state = self.write();
        if state.users.contains_key(handle) {
            return Err(BlogError::DuplicateIdentity(handle.to_string()));
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            handle: handle.to_string(),
            credential_digest: credential_digest.to_string(),
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.users.insert(
            handle.to_string(),
            Stored {
                seq,
                record: identity.clone(),
            },
        );
        Ok(identity)
    }

    async fn fetch(&self, handle: &str) -> BlogResult<Identity> {
        self.read()
            .users
            .get(handle)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| BlogError::IdentityNotFound(handle.to_string()))
    }

    async fn fetch_page(&self, page: PageRequest) -> BlogResult<Page<Identity>> {
        let state = self.read();
        let mut users: Vec<&Stored<Identity>> = state.users.values().collect();
        users.sort_by_key(|stored| (stored.record.created_at, stored.seq));
        paginate(users, page)
    }

    async fn update_credential(
        &self,
        handle: &str,
        credential_digest: &str,
    ) -> BlogResult<Identity> {
        let mut state = self.write();
        let stored = state
            .users
            .get_mut(handle)
            .ok_or_else(|| BlogError::IdentityNotFound(handle.to_string()))?;

        stored.record.credential_digest = credential_digest.to_string();
        stored.record.updated_at = Utc::now();
        Ok(stored.record.clone())
    }

    async fn delete(&self, handle: &str) -> BlogResult<()> {
        let mut state = self.write();
        if state.users.remove(handle).is_none() {
            return Err(BlogError::IdentityNotFound(handle.to_string()));
        }
        state.posts.retain(|_, stored| stored.record.author != handle);
        Ok(())
    }

    async fn health_check(&self) -> BlogResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn create(&self, post: NewPost, author: &str) -> BlogResult<Post> {
        let mut state = self.write();
        if !state.users.contains_key(author) {
            return Err(BlogError::IdentityNotFound(author.to_string()));
        }
        if state.posts.contains_key(&post.handle) {
            return Err(BlogError::DuplicateItem(post.handle));
        }

        let now = Utc::now();
        let created = Post {
            handle: post.handle,
            author: author.to_string(),
            title: post.title,
            summary: post.summary,
            body: post.body,
            created_at: now,
            updated_at: now,
        };
        let seq = state.next_seq();
        state.posts.insert(
            created.handle.clone(),
            Stored {
                seq,
                record: created.clone(),
            },
        );
        Ok(created)
    }

    async fn fetch(&self, handle: &str) -> BlogResult<Post> {
        self.read()
            .posts
            .get(handle)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| BlogError::ItemNotFound(handle.to_string()))
    }

    async fn fetch_page(&self, page: PageRequest, order: Recency) -> BlogResult<Page<Post>> {
        let state = self.read();
        let mut posts: Vec<&Stored<Post>> = state.posts.values().collect();
        posts.sort_by_key(|stored| (stored.record.created_at, stored.seq));
        if order == Recency::NewestFirst {
            posts.reverse();
        }
        paginate(posts, page)
    }

    async fn update(&self, handle: &str, update: PostUpdate) -> BlogResult<Post> {
        let mut state = self.write();
        let stored = state
            .posts
            .get_mut(handle)
            .ok_or_else(|| BlogError::ItemNotFound(handle.to_string()))?;

        let record = &mut stored.record;
        if let Some(title) = update.title {
            record.title = Some(title);
        }
        if let Some(summary) = update.summary {
            record.summary = Some(summary);
        }
        if let Some(body) = update.body {
            record.body = Some(body);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, handle: &str) -> BlogResult<()> {
        if self.write().posts.remove(handle).is_none() {
            return Err(BlogError::ItemNotFound(handle.to_string()));
        }
        Ok(())
    }
}
