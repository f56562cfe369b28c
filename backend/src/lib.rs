//! Blog Backend Library
//!
//! Credential handling, session tokens, the request guard and the account
//! and post stores, plus the HTTP layer built on them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
