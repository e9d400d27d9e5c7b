use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Payload for creating a new account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Desired unique username.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
}

/// Login payload. The principal is tried as a username first, then as
/// an email.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email identifying the account.
    pub username_or_email: String,
    /// Plaintext password.
    pub password: String,
}

/// Payload for exchanging a refresh credential.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The opaque refresh token issued at login.
    pub refresh_token: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Signed JWT access token.
    pub access_token: String,
    /// Opaque refresh credential.
    pub refresh_token: String,
    /// Always "Bearer".
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Id of the authenticated user.
    pub user_id: String,
    /// Username of the authenticated user.
    pub username: String,
    /// Email of the authenticated user.
    pub email: String,
}

/// User summary returned by register, /me and the admin role grant.
/// Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User id.
    pub id: String,
    /// Unique username.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Whether the account may authenticate.
    pub enabled: bool,
    /// False once the account has been administratively locked.
    pub account_non_locked: bool,
    /// Assigned role names.
    pub roles: Vec<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last modified.
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    /// Builds the response from a principal and its resolved role names.
    pub fn from_user(user: &User, roles: Vec<String>) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            enabled: user.enabled,
            account_non_locked: user.account_non_locked,
            roles,
            created_at: user.audit.created_at,
            updated_at: user.audit.updated_at,
        }
    }
}

// ============= Domain Models =============

/// Creation/modification timestamps shared by persisted records.
/// Composed into the owning struct rather than inherited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuditInfo {
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl AuditInfo {
    /// Both timestamps set to the current instant.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }
}

/// A principal. The authority set is derived from the assigned roles,
/// never stored on the row itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key (UUID string).
    pub id: String,
    /// Unique username.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// PHC-formatted Argon2id hash; never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account may authenticate.
    pub enabled: bool,
    /// False once the account has been administratively locked.
    pub account_non_locked: bool,
    /// Creation and modification timestamps.
    #[serde(flatten)]
    pub audit: AuditInfo,
}

/// Reference data. Seeded at schema init, extended only through the
/// admin grant operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Primary key (UUID string).
    pub id: String,
    /// Role name, e.g. `ROLE_USER`.
    pub name: String,
    /// Human-readable purpose of the role.
    pub description: String,
}

/// A persisted renewal credential. Expiry is time-derived at the next
/// renewal attempt; revocation is an explicit flag.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Primary key (UUID string).
    pub id: String,
    /// The opaque credential string handed to the client.
    pub token: String,
    /// Owning user's id.
    pub user_id: String,
    /// Instant after which the credential is unusable.
    pub expires_at: DateTime<Utc>,
    /// Whether the credential was explicitly invalidated.
    pub revoked: bool,
    /// When the credential was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// True once `expires_at` is in the past.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

// ============= Access Token Claims =============

/// Claims embedded in a signed access token. `roles` is a comma-joined
/// string, matching the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Comma-joined role names.
    pub roles: String,
    /// Issued-at, seconds since the epoch.
    pub iat: usize,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
    /// Issuer identifier.
    pub iss: String,
}

// ============= Error Types =============

/// Uniform error body returned by every failure path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// When the error was produced.
    pub timestamp: DateTime<Utc>,
    /// HTTP status code.
    pub status: u16,
    /// Short error label, e.g. "Not Found".
    pub error: String,
    /// Client-facing message.
    pub message: String,
    /// Request path that failed.
    pub path: String,
    /// Per-field messages, present only for validation failures.
    #[serde(rename = "validationErrors", skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, String>>,
}

/// Application-level failure, rendered as a uniform JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Authentication failed; deliberately vague to clients.
    #[error("{0}")]
    InvalidCredentials(String),

    /// A refresh credential is past its expiry.
    #[error("{0}")]
    TokenExpired(String),

    /// A refresh credential was explicitly invalidated.
    #[error("{0}")]
    TokenRevoked(String),

    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint would be violated.
    #[error("Duplicate resource: {0}")]
    Duplicate(String),

    /// The caller lacks the required role.
    #[error("Access denied")]
    AccessDenied,

    /// Per-field input validation failures.
    #[error("Validation failed")]
    Validation(HashMap<String, String>),

    /// Storage-layer failure; detail is logged, not returned.
    #[error("Database error: {0}")]
    Database(String),

    /// Any other unexpected failure; detail is logged, not returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AppError::InvalidCredentials(_)
            | AppError::TokenExpired(_)
            | AppError::TokenRevoked(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials(_) => "Unauthorized",
            AppError::TokenExpired(_) => "Token Expired",
            AppError::TokenRevoked(_) => "Token Revoked",
            AppError::NotFound(_) => "Not Found",
            AppError::Duplicate(_) => "Conflict",
            AppError::AccessDenied => "Forbidden",
            AppError::Validation(_) => "Validation Failed",
            AppError::Database(_) | AppError::Internal(_) => "Internal Server Error",
        }
    }

    /// Client-facing message. Internal detail is withheld for 500s and
    /// logged instead.
    fn client_message(&self) -> String {
        match self {
            AppError::AccessDenied => {
                "You don't have permission to access this resource".to_string()
            }
            AppError::Validation(_) => "Invalid input data".to_string(),
            AppError::Database(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        let validation_errors = match &self {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };

        let body = ErrorBody {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: self.label().to_string(),
            message: self.client_message(),
            // Filled in by the error envelope middleware, which knows
            // the request path.
            path: String::new(),
            validation_errors,
        };

        let mut response = (status, axum::Json(&body)).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Crate-wide result alias over [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
