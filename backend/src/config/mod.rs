//! Configuration management for the blog backend
//!
//! Configuration is loaded hierarchically:
//! 1. Default values (in code)
//! 2. TOML config files (config/development.toml or config/production.toml)
//! 3. Environment variables (prefix: BLOG__)
//!
//! The signing secret and bcrypt cost are read once here and handed to
//! `AppState`; nothing changes them after startup.

use crate::auth::DEFAULT_COST;
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::env;

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Application configuration
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    pub pagination: PaginationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
///
/// An empty `url` runs the server on the in-memory store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Credential configuration
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub bcrypt_cost: u32,
}

/// Default account created at startup when both fields are set
#[derive(Debug, Default, Deserialize)]
pub struct BootstrapConfig {
    pub default_user: Option<String>,
    pub default_password: Option<SecretString>,
}

/// Listing page sizes
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: SecretString::new(DEV_JWT_SECRET.to_string()),
                bcrypt_cost: DEFAULT_COST,
            },
            bootstrap: BootstrapConfig::default(),
            pagination: PaginationConfig {
                default_page_size: 10,
                max_page_size: 100,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Loading order (later sources override earlier):
    /// 1. Default values
    /// 2. Config file based on RUST_ENV (development.toml or production.toml)
    /// 3. Environment variables with BLOG__ prefix
    pub fn load() -> Result<Self> {
        let env = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let config_file = format!("config/{}.toml", env);
        let defaults = AppConfig::default();

        let config = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections),
            )?
            .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
            .set_default("auth.bcrypt_cost", i64::from(defaults.auth.bcrypt_cost))?
            .set_default("pagination.default_page_size", defaults.pagination.default_page_size)?
            .set_default("pagination.max_page_size", defaults.pagination.max_page_size)?
            .add_source(config::File::with_name(&config_file).required(false))
            // e.g., BLOG__AUTH__JWT_SECRET sets auth.jwt_secret
            .add_source(config::Environment::with_prefix("BLOG").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check if running in production mode
    pub fn is_production() -> bool {
        env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false)
    }

    /// Problems that make this configuration unfit for production
    pub fn production_errors(&self) -> Vec<&'static str> {
        let mut errors = Vec::new();

        let secret = self.auth.jwt_secret.expose_secret();
        if secret.contains("development") || secret.len() < MIN_PRODUCTION_SECRET_LEN {
            errors.push("JWT secret must be at least 32 bytes and not contain 'development'");
        }
        if self.auth.bcrypt_cost < DEFAULT_COST {
            errors.push("bcrypt cost must be at least 10");
        }
        if self.pagination.default_page_size < 1
            || self.pagination.max_page_size < self.pagination.default_page_size
        {
            errors.push("page sizes must satisfy 1 <= default_page_size <= max_page_size");
        }

        errors
    }

    /// Default account credentials, if fully configured
    pub fn default_account(&self) -> Option<(&str, &str)> {
        let user = self.bootstrap.default_user.as_deref()?.trim();
        let password = self.bootstrap.default_password.as_ref()?.expose_secret();
        if user.is_empty() || password.is_empty() {
            return None;
        }
        Some((user, password.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.database.url.is_empty());
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.pagination.default_page_size, 10);
        assert!(config.default_account().is_none());
    }

    #[test]
    fn test_is_production() {
        // Default should be false (development)
        assert!(!AppConfig::is_production());
    }

    #[test]
    fn test_default_secret_unfit_for_production() {
        let errors = AppConfig::default().production_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("JWT secret"));
    }

    #[test]
    fn test_strong_config_fit_for_production() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret =
            SecretString::new("0123456789abcdef0123456789abcdef-prod".to_string());
        assert!(config.production_errors().is_empty());

        config.auth.bcrypt_cost = 4;
        assert_eq!(config.production_errors(), ["bcrypt cost must be at least 10"]);
    }

    #[test]
    fn test_default_account_requires_both_fields() {
        let mut config = AppConfig::default();
        config.bootstrap.default_user = Some("admin".to_string());
        assert!(config.default_account().is_none());

        config.bootstrap.default_password = Some(SecretString::new("changeme".to_string()));
        assert_eq!(config.default_account(), Some(("admin", "changeme")));

        config.bootstrap.default_user = Some("  ".to_string());
        assert!(config.default_account().is_none());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut config = AppConfig::default();
        config.bootstrap.default_password = Some(SecretString::new("hunter22".to_string()));
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains(DEV_JWT_SECRET));
        assert!(!debug_str.contains("hunter22"));
    }
}
