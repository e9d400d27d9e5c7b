//! # Gatehouse
//!
//! Authentication and session backend for a small internal administrative
//! service: signed JWT access tokens, persisted refresh credentials with
//! expiry and revocation, and per-request role gating.
//!
//! ## Overview
//!
//! Gatehouse can be used in two ways:
//!
//! 1. **As a standalone server** - run the `gatehouse-server` binary
//! 2. **As a library** - embed the router or individual components
//!
//! ## Quick start (library usage)
//!
//! ```rust,ignore
//! use gatehouse::{api::routes::create_router, db::LibsqlStore, utils::config::Config, AppState};
//! use std::sync::Arc;
//!
//! let config = Arc::new(Config::from_env()?);
//! let store = Arc::new(LibsqlStore::new_local(&config.database.path).await?);
//! let app = create_router(AppState::new(config, store));
//! ```
//!
//! ## Request flow
//!
//! client -> auth gate (bearer extraction/validation, fail-open) ->
//! role gate (per-route requirement) -> handler. Login, registration,
//! and refresh are public; only [`auth::AuthService`] mints tokens or
//! mutates the refresh-credential store.
//!
//! ## Modules
//!
//! - [`api`] - REST handlers, router assembly, OpenAPI documentation
//! - [`auth`] - password hashing, token codec, authenticator, gates
//! - [`db`] - libsql-backed user directory and renewal store
//! - [`types`] - DTOs, domain models, and error handling
//! - [`utils`] - environment configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication core: hashing, tokens, service, middleware gates.
pub mod auth;
/// Database store (libsql) behind the `AuthStore` trait.
pub mod db;
/// Core types (requests, responses, models, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthService, CurrentUser, PasswordHasher, RolePolicy, TokenCodec, TokenError};
pub use db::{AuthStore, LibsqlStore};
pub use types::{AppError, Result};
pub use utils::config::Config;

use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide configuration, immutable after startup.
    pub config: Arc<Config>,
    /// User directory and renewal store.
    pub store: Arc<dyn AuthStore>,
    /// Credential authenticator; sole minter of tokens.
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires the token codec and authenticator from configuration.
    pub fn new(config: Arc<Config>, store: Arc<dyn AuthStore>) -> Self {
        let codec = TokenCodec::new(
            &config.auth.jwt_secret,
            &config.auth.jwt_issuer,
            config.auth.access_token_ttl,
        );
        let auth = Arc::new(AuthService::new(
            store.clone(),
            codec,
            config.auth.refresh_token_ttl,
        ));
        Self {
            config,
            store,
            auth,
        }
    }
}
