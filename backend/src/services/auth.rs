//! Authentication service
//!
//! Orchestrates [`PasswordService`], an [`AccountStore`] and [`JwtService`]:
//!
//! - login: fetch account, verify password, issue session token
//! - register: hash, then create
//! - change credential: re-verify the old password, then store a new digest
//!
//! Login never says whether the account exists. A missing account and a
//! wrong password both come back as `InvalidCredentials`. Registration does
//! report `DuplicateIdentity` for a taken handle.
//!
//! Hashing and verification run on the blocking thread pool; no lock is held
//! across them.

use crate::auth::{JwtService, PasswordService};
use crate::error::{BlogError, BlogResult};
use crate::repositories::{AccountStore, Identity};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Issued session credential
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
}

/// Authentication service
///
/// Cheap to clone; shared through `AppState`.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    passwords: PasswordService,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, passwords: PasswordService, jwt: JwtService) -> Self {
        Self {
            accounts,
            passwords,
            jwt,
        }
    }

    /// Check a handle/password pair and issue a session for it
    pub async fn login(&self, handle: &str, password: &str) -> BlogResult<Session> {
        let identity = match self.accounts.fetch(handle).await {
            Ok(identity) => identity,
            Err(BlogError::IdentityNotFound(_)) => {
                debug!(handle, "login for unknown user");
                counter!("blog_login_attempts_total", "outcome" => "rejected").increment(1);
                return Err(BlogError::InvalidCredentials);
            }
            Err(err) => {
                warn!(handle, error = %err, "account lookup failed during login");
                counter!("blog_login_attempts_total", "outcome" => "rejected").increment(1);
                return Err(BlogError::InvalidCredentials);
            }
        };

        let valid = self
            .passwords
            .verify_async(password.to_string(), identity.credential_digest)
            .await;
        if !valid {
            debug!(handle, "login with wrong password");
            counter!("blog_login_attempts_total", "outcome" => "rejected").increment(1);
            return Err(BlogError::InvalidCredentials);
        }

        let token = self.jwt.issue(&identity.handle)?;
        counter!("blog_login_attempts_total", "outcome" => "success").increment(1);
        info!(handle, "user logged in");

        Ok(Session {
            token,
            expires_in: self.jwt.lifetime_secs(),
        })
    }

    /// Create an account. Nothing is written if hashing fails.
    pub async fn register(&self, handle: &str, password: &str) -> BlogResult<Identity> {
        let digest = self.passwords.hash_async(password.to_string()).await?;
        let identity = self.accounts.create(handle, &digest).await?;

        counter!("blog_registrations_total").increment(1);
        info!(handle, "user registered");
        Ok(identity)
    }

    /// Replace a password after checking the current one
    pub async fn change_credential(
        &self,
        handle: &str,
        old_password: &str,
        new_password: &str,
    ) -> BlogResult<Identity> {
        let identity = self.accounts.fetch(handle).await?;

        let valid = self
            .passwords
            .verify_async(old_password.to_string(), identity.credential_digest)
            .await;
        if !valid {
            debug!(handle, "credential change with wrong old password");
            return Err(BlogError::InvalidCredentials);
        }

        let digest = self.passwords.hash_async(new_password.to_string()).await?;
        let updated = self.accounts.update_credential(handle, &digest).await?;

        info!(handle, "user credential changed");
        Ok(updated)
    }

    /// Create the default account unless it already exists
    ///
    /// Idempotent: losing a registration race to another instance counts as
    /// success.
    pub async fn ensure_default_account(&self, handle: &str, password: &str) -> BlogResult<()> {
        match self.accounts.fetch(handle).await {
            Ok(_) => {
                debug!(handle, "default user already present");
                return Ok(());
            }
            Err(BlogError::IdentityNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        match self.register(handle, password).await {
            Ok(_) => {
                info!(handle, "created default user");
                Ok(())
            }
            Err(BlogError::DuplicateIdentity(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{HashingError, MAX_PASSWORD_BYTES};
    use crate::repositories::{InMemoryStore, PageRequest};

    const TEST_COST: u32 = 4;

    fn service_with_store() -> (AuthService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let service = AuthService::new(
            store.clone(),
            PasswordService::new(TEST_COST),
            JwtService::new("test-secret-key-for-testing-only-32chars"),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, _) = service_with_store();
        service.register("alice", "Secr3t!").await.unwrap();

        let session = service.login("alice", "Secr3t!").await.unwrap();
        assert_eq!(session.expires_in, 86_400);
        let jwt = JwtService::new("test-secret-key-for-testing-only-32chars");
        assert_eq!(jwt.verify(&session.token).unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let (service, _) = service_with_store();
        service.register("alice", "Secr3t!").await.unwrap();

        let wrong_password = service.login("alice", "wrong").await.unwrap_err();
        let unknown_user = service.login("bob", "anything").await.unwrap_err();

        assert!(matches!(wrong_password, BlogError::InvalidCredentials));
        assert!(matches!(unknown_user, BlogError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_stored_digest_is_not_plaintext() {
        let (service, store) = service_with_store();
        let identity = service.register("alice", "Secr3t!").await.unwrap();
        assert_ne!(identity.credential_digest, "Secr3t!");

        let stored = store.fetch("alice").await.unwrap();
        assert!(stored.credential_digest.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_change_credential() {
        let (service, _) = service_with_store();
        service.register("alice", "Secr3t!").await.unwrap();

        service
            .change_credential("alice", "Secr3t!", "NewPass1")
            .await
            .unwrap();

        assert!(matches!(
            service.login("alice", "Secr3t!").await,
            Err(BlogError::InvalidCredentials)
        ));
        assert!(service.login("alice", "NewPass1").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_credential_requires_old_password() {
        let (service, _) = service_with_store();
        service.register("alice", "Secr3t!").await.unwrap();

        let err = service
            .change_credential("alice", "not-it", "NewPass1")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidCredentials));
        assert!(service.login("alice", "Secr3t!").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_credential_for_unknown_user() {
        let (service, _) = service_with_store();
        let err = service
            .change_credential("ghost", "a", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::IdentityNotFound(_)));
    }

    #[tokio::test]
    async fn test_oversized_password_writes_nothing() {
        let (service, store) = service_with_store();
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);

        let err = service.register("alice", &long).await.unwrap_err();
        assert!(matches!(
            err,
            BlogError::Hashing(HashingError::InputTooLong { .. })
        ));

        let page = store.fetch_page(PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_oversized_new_password_keeps_old_one() {
        let (service, _) = service_with_store();
        service.register("alice", "Secr3t!").await.unwrap();
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);

        let err = service
            .change_credential("alice", "Secr3t!", &long)
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::Hashing(_)));
        assert!(service.login("alice", "Secr3t!").await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_registration_reports_existence() {
        let (service, _) = service_with_store();
        service.register("alice", "Secr3t!").await.unwrap();
        let err = service.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, BlogError::DuplicateIdentity(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_single_winner() {
        let (service, _) = service_with_store();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                service.register("race", &format!("password-{}", i)).await
            }));
        }

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(BlogError::DuplicateIdentity(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_ensure_default_account_is_idempotent() {
        let (service, store) = service_with_store();
        service.ensure_default_account("admin", "changeme").await.unwrap();
        service.ensure_default_account("admin", "different").await.unwrap();

        let page = store.fetch_page(PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 1);

        // The first password stays in effect
        assert!(service.login("admin", "changeme").await.is_ok());
        assert!(service.login("admin", "different").await.is_err());
    }
}
