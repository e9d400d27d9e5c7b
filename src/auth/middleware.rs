use crate::auth::token::TokenCodec;
use crate::types::{AppError, User};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Paths the gate never inspects: registration, login, renewal, docs,
/// health. Prefix match on the request path.
const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/register",
    "/api/auth/login",
    "/api/auth/refresh",
    "/api-docs",
    "/swagger-ui",
    "/health",
];

fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|public| path.starts_with(public))
}

/// The request-scoped authentication context: a resolved principal and
/// its role-derived authorities. Lives only in request extensions and is
/// dropped with the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The resolved principal.
    pub user: User,
    /// Role names derived from the principal's assignments.
    pub authorities: Vec<String>,
}

impl CurrentUser {
    /// Whether the principal holds the named role.
    pub fn has_authority(&self, role: &str) -> bool {
        self.authorities.iter().any(|a| a == role)
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidCredentials("No authenticated user found".to_string())
            })
    }
}

/// Per-request authentication gate.
///
/// Extracts the bearer token, validates it, resolves the subject, and
/// attaches a [`CurrentUser`]. Deliberately fails open: a missing,
/// malformed, or stale token leaves the request unauthenticated and the
/// downstream gate or handler rejects it. Public endpoints must stay
/// reachable even with a garbage Authorization header present.
pub async fn auth_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if is_public_path(req.uri().path()) {
        return next.run(req).await;
    }

    // Case-sensitive "Bearer " prefix; the remainder is the token.
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string);

    if let Some(token) = bearer {
        match state.auth.codec().validate(&token) {
            Ok(claims) => {
                let subject = TokenCodec::subject_of(&claims);
                match state.auth.resolve_subject(subject).await {
                    Ok((user, authorities)) => {
                        tracing::debug!("authenticated '{}' via bearer token", user.username);
                        req.extensions_mut().insert(CurrentUser { user, authorities });
                    }
                    Err(e) => {
                        // Valid token but the subject no longer resolves;
                        // continue unauthenticated.
                        tracing::warn!("bearer subject '{}' not resolvable: {}", subject, e);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("rejected bearer token: {}", e);
            }
        }
    }

    next.run(req).await
}

/// Route-to-required-role table consulted by [`role_gate`]. Data-driven
/// so endpoint requirements live in one place instead of per-handler
/// attributes.
#[derive(Debug, Default)]
pub struct RolePolicy {
    rules: Vec<PolicyRule>,
}

#[derive(Debug)]
struct PolicyRule {
    method: Method,
    path_prefix: String,
    role: String,
}

impl RolePolicy {
    /// Empty policy; nothing is role-gated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule: requests matching `method` and `path_prefix` demand
    /// `role`.
    pub fn require(mut self, method: Method, path_prefix: &str, role: &str) -> Self {
        self.rules.push(PolicyRule {
            method,
            path_prefix: path_prefix.to_string(),
            role: role.to_string(),
        });
        self
    }

    /// The shipped policy: all admin operations demand ROLE_ADMIN.
    pub fn admin_defaults() -> Self {
        Self::new().require(Method::PUT, "/api/admin/", "ROLE_ADMIN")
    }

    /// The role the first matching rule demands, if any.
    pub fn required_role(&self, method: &Method, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.method == *method && path.starts_with(&rule.path_prefix))
            .map(|rule| rule.role.as_str())
    }
}

/// Declarative role check. Runs strictly after [`auth_gate`] and before
/// the business handler; an absent context and a missing role both deny.
pub async fn role_gate(
    State(policy): State<Arc<RolePolicy>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(required) = policy.required_role(req.method(), req.uri().path()) {
        let authorized = req
            .extensions()
            .get::<CurrentUser>()
            .map(|current| current.has_authority(required))
            .unwrap_or(false);

        if !authorized {
            tracing::warn!(
                "denied {} {}: missing required role {}",
                req.method(),
                req.uri().path(),
                required
            );
            return AppError::AccessDenied.into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuditInfo;

    fn current_user(authorities: &[&str]) -> CurrentUser {
        CurrentUser {
            user: User {
                id: "u1".into(),
                username: "alice".into(),
                email: "alice@x.com".into(),
                password_hash: String::new(),
                enabled: true,
                account_non_locked: true,
                audit: AuditInfo::now(),
            },
            authorities: authorities.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_public_path_matching() {
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/api/auth/register"));
        assert!(is_public_path("/api/auth/refresh"));
        assert!(is_public_path("/health"));
        assert!(is_public_path("/api-docs/openapi.json"));
        assert!(!is_public_path("/api/auth/me"));
        assert!(!is_public_path("/api/auth/logout"));
        assert!(!is_public_path("/api/admin/users/1/roles/admin"));
    }

    #[test]
    fn test_authority_check() {
        let current = current_user(&["ROLE_USER", "ROLE_ADMIN"]);
        assert!(current.has_authority("ROLE_ADMIN"));
        assert!(!current.has_authority("ROLE_AUDITOR"));
    }

    #[test]
    fn test_policy_lookup_is_method_and_prefix_scoped() {
        let policy = RolePolicy::admin_defaults();
        assert_eq!(
            policy.required_role(&Method::PUT, "/api/admin/users/u1/roles/admin"),
            Some("ROLE_ADMIN")
        );
        assert_eq!(policy.required_role(&Method::GET, "/api/admin/users"), None);
        assert_eq!(policy.required_role(&Method::PUT, "/api/auth/me"), None);
    }
}
