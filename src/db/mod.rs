//! Persistence layer.
//!
//! The authentication core never talks to SQL directly; it depends on the
//! [`AuthStore`] trait, which bundles principal lookup (the user
//! directory) and refresh-credential persistence (the renewal store).
//! [`LibsqlStore`] is the libsql-backed implementation, covering both a
//! local database file and `:memory:` for tests.

/// libsql-backed implementation.
pub mod store;
/// The `AuthStore` trait.
pub mod traits;

pub use store::LibsqlStore;
pub use traits::AuthStore;
