//! Account reads and deletion
//!
//! Registration and password changes go through `AuthService`; they are
//! the only writes to a credential digest.

use crate::error::BlogResult;
use crate::repositories::{AccountStore, Identity, Page, PageRequest};
use tracing::info;

/// User service for account management
pub struct UserService;

impl UserService {
    /// Get one account by handle
    pub async fn get(store: &dyn AccountStore, handle: &str) -> BlogResult<Identity> {
        store.fetch(handle).await
    }

    /// List accounts in creation order
    pub async fn list(store: &dyn AccountStore, page: PageRequest) -> BlogResult<Page<Identity>> {
        store.fetch_page(page).await
    }

    /// Delete an account together with its posts
    pub async fn delete(store: &dyn AccountStore, handle: &str, requested_by: &str) -> BlogResult<()> {
        store.delete(handle).await?;
        info!(handle, requested_by, "user deleted");
        Ok(())
    }
}
