//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! The signing secret and bcrypt cost are consumed here, once. The JWT keys
//! derived from the secret live inside `JwtService` and are never replaced,
//! so tokens stay valid for the life of the process.

use crate::auth::{JwtService, PasswordService};
use crate::config::AppConfig;
use crate::repositories::{
    AccountStore, ContentStore, InMemoryStore, PgAccountStore, PgContentStore,
};
use crate::services::AuthService;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
///
/// Every field is an `Arc` or a cheap handle, so cloning per request is O(1).
#[derive(Clone)]
pub struct AppState {
    accounts: Arc<dyn AccountStore>,
    posts: Arc<dyn ContentStore>,
    config: Arc<AppConfig>,
    jwt: JwtService,
    auth: AuthService,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        Self::with_stores(
            Arc::new(PgAccountStore::new(db.clone())),
            Arc::new(PgContentStore::new(db)),
            config,
        )
    }

    /// State backed by a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_stores(store.clone(), store, config)
    }

    pub fn with_stores(
        accounts: Arc<dyn AccountStore>,
        posts: Arc<dyn ContentStore>,
        config: AppConfig,
    ) -> Self {
        let jwt = JwtService::new(config.auth.jwt_secret.expose_secret());
        let passwords = PasswordService::new(config.auth.bcrypt_cost);
        let auth = AuthService::new(accounts.clone(), passwords, jwt.clone());

        Self {
            accounts,
            posts,
            config: Arc::new(config),
            jwt,
            auth,
        }
    }

    #[inline]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.accounts.as_ref()
    }

    #[inline]
    pub fn posts(&self) -> &dyn ContentStore {
        self.posts.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }
}
