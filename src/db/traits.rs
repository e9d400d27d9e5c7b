use crate::types::{RefreshToken, Result, Role, User};
use async_trait::async_trait;

/// The narrow persistence interface the authentication core consumes.
///
/// One half is the user directory (principals, roles, authority
/// derivation), the other the renewal store (refresh credentials with
/// expiry and revocation state). Splitting them would force every caller
/// to carry two handles for what is a single database.
#[async_trait]
pub trait AuthStore: Send + Sync {
    // User directory

    /// Looks up a principal by exact username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Looks up a principal by exact email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Looks up a principal by id.
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
    /// Whether any principal already holds this username.
    async fn username_exists(&self, username: &str) -> Result<bool>;
    /// Whether any principal already holds this email.
    async fn email_exists(&self, email: &str) -> Result<bool>;
    /// Persists a new principal and assigns `default_role` in one
    /// transaction.
    async fn create_user(&self, user: &User, default_role: &str) -> Result<()>;
    /// The roles assigned to a principal, ordered by name.
    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>>;
    /// Assigns a role by name; already holding it is not an error.
    async fn add_role_to_user(&self, user_id: &str, role_name: &str) -> Result<()>;
    /// Looks up a role by its name.
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    // Renewal store

    /// Persists a freshly issued refresh credential.
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()>;
    /// Looks up a refresh credential by its opaque token value.
    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;
    /// Deletes a single refresh credential by id.
    async fn delete_refresh_token(&self, id: &str) -> Result<()>;
    /// Deletes every credential of a user; returns how many were removed.
    /// Zero deletions is not an error.
    async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<u64>;
}
