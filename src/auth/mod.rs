//! Authentication core.
//!
//! Four pieces, leaves first:
//!
//! - [`password`] - Argon2id hashing and verification of credentials
//! - [`token`] - HS256 access-token signing and validation
//! - [`service`] - login, registration, renewal, and logout orchestration
//! - [`middleware`] - the two-stage per-request check: the auth gate
//!   resolves an identity (fail-open to anonymous), the role gate then
//!   enforces the per-route role requirement
//!
//! Access tokens are self-contained and unpersisted; renewal credentials
//! are opaque strings persisted through [`crate::db::AuthStore`] with
//! expiry and revocation state.

/// Request gates and the `CurrentUser` extractor.
pub mod middleware;
/// Argon2id password hashing.
pub mod password;
/// Login, registration, renewal, and logout orchestration.
pub mod service;
/// HS256 access-token signing and validation.
pub mod token;

pub use middleware::{auth_gate, role_gate, CurrentUser, RolePolicy};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{TokenCodec, TokenError};
