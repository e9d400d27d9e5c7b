use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenCodec;
use crate::db::AuthStore;
use crate::types::{
    AppError, LoginResponse, RefreshToken, RegisterRequest, Result, User, UserResponse,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

/// Orchestrates login, registration, renewal, and logout. The only
/// component that mints access tokens or mutates the renewal store.
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    refresh_ttl_secs: i64,
}

impl AuthService {
    /// Wires the service from its store, codec, and refresh lifetime.
    pub fn new(store: Arc<dyn AuthStore>, codec: TokenCodec, refresh_ttl_secs: i64) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
            codec,
            refresh_ttl_secs,
        }
    }

    /// The token codec, shared with the request gate for validation.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// The password hasher.
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Authenticates by username with email fallback. Unknown principal,
    /// wrong password, and disabled/locked accounts all fail with the
    /// same `InvalidCredentials`, so callers cannot enumerate accounts.
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<LoginResponse> {
        tracing::info!("login attempt for '{}'", username_or_email);

        let user = match self.resolve_principal(username_or_email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("login failed for '{}': unknown principal", username_or_email);
                return Err(invalid_credentials());
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            tracing::warn!("login failed for '{}': password mismatch", user.username);
            return Err(invalid_credentials());
        }

        if !user.enabled || !user.account_non_locked {
            tracing::warn!("login failed for '{}': account disabled or locked", user.username);
            return Err(invalid_credentials());
        }

        let roles = self.role_names(&user.id).await?;
        let access_token = self.codec.issue(&user.username, &roles)?;
        let refresh_token = self.create_refresh_token(&user).await?;

        tracing::info!("user '{}' logged in", user.username);

        Ok(self.login_response(&user, access_token, refresh_token))
    }

    /// Registers a new principal with the default role. Username and
    /// email are checked independently so the conflict message names the
    /// offending field.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserResponse> {
        tracing::info!("registration attempt for '{}'", request.username);

        if self.store.username_exists(&request.username).await? {
            return Err(AppError::Duplicate(format!(
                "Username already exists: {}",
                request.username
            )));
        }
        if self.store.email_exists(&request.email).await? {
            return Err(AppError::Duplicate(format!(
                "Email already exists: {}",
                request.email
            )));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: self.hasher.hash(&request.password)?,
            enabled: true,
            account_non_locked: true,
            audit: crate::types::AuditInfo::now(),
        };

        self.store.create_user(&user, "ROLE_USER").await?;
        let roles = self.role_names(&user.id).await?;

        tracing::info!("user '{}' registered", user.username);

        Ok(UserResponse::from_user(&user, roles))
    }

    /// Exchanges a refresh credential for a fresh access token. The same
    /// refresh token string is returned; credentials are not rotated on
    /// renewal.
    pub async fn refresh(&self, token_value: &str) -> Result<LoginResponse> {
        tracing::info!("token refresh attempt");

        let credential = self
            .store
            .find_refresh_token(token_value)
            .await?
            .ok_or_else(|| AppError::NotFound("Refresh token not found".to_string()))?;

        if credential.is_expired() {
            // Lazy expiry: the credential is removed the moment its
            // expiry is observed. A second attempt sees NotFound.
            self.store.delete_refresh_token(&credential.id).await?;
            return Err(AppError::TokenExpired(
                "Refresh token has expired".to_string(),
            ));
        }

        if credential.revoked {
            return Err(AppError::TokenRevoked(
                "Refresh token has been revoked".to_string(),
            ));
        }

        let user = self
            .store
            .find_user_by_id(&credential.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let roles = self.role_names(&user.id).await?;
        let access_token = self.codec.issue(&user.username, &roles)?;

        tracing::info!("token refreshed for user '{}'", user.username);

        Ok(self.login_response(&user, access_token, credential.token))
    }

    /// Removes every renewal credential the user owns. Logging out a
    /// user with no active credentials is a no-op.
    pub async fn logout(&self, username: &str) -> Result<()> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", username)))?;

        let deleted = self.store.delete_refresh_tokens_for_user(&user.id).await?;
        tracing::info!("user '{}' logged out, {} credential(s) removed", username, deleted);
        Ok(())
    }

    /// Resolves a validated bearer subject to a principal with its
    /// derived authorities. Used by the request gate.
    pub async fn resolve_subject(&self, subject: &str) -> Result<(User, Vec<String>)> {
        let user = self
            .store
            .find_user_by_username(subject)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", subject)))?;
        let roles = self.role_names(&user.id).await?;
        Ok((user, roles))
    }

    async fn resolve_principal(&self, username_or_email: &str) -> Result<Option<User>> {
        if let Some(user) = self.store.find_user_by_username(username_or_email).await? {
            return Ok(Some(user));
        }
        self.store.find_user_by_email(username_or_email).await
    }

    async fn role_names(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .roles_for_user(user_id)
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect())
    }

    async fn create_refresh_token(&self, user: &User) -> Result<String> {
        let credential = RefreshToken {
            id: Uuid::new_v4().to_string(),
            token: generate_opaque_token(),
            user_id: user.id.clone(),
            expires_at: Utc::now() + Duration::seconds(self.refresh_ttl_secs),
            revoked: false,
            created_at: Utc::now(),
        };
        self.store.insert_refresh_token(&credential).await?;
        Ok(credential.token)
    }

    fn login_response(
        &self,
        user: &User,
        access_token: String,
        refresh_token: String,
    ) -> LoginResponse {
        LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.codec.ttl_secs(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

fn invalid_credentials() -> AppError {
    AppError::InvalidCredentials("Invalid username or password".to_string())
}

/// 256 bits of randomness, hex-encoded. Opaque by construction: nothing
/// about the owning principal is derivable from the token string.
fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_tokens_are_unique_and_hex() {
        let first = generate_opaque_token();
        let second = generate_opaque_token();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
