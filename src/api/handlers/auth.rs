use crate::{
    api::handlers::JsonBody,
    auth::CurrentUser,
    types::{
        AppError, ErrorBody, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, Result,
        UserResponse,
    },
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use std::collections::HashMap;

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Username or email already taken", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    validate_register(&payload)?;
    let user = state.auth.register(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with username or email and receive a token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    validate_login(&payload)?;
    let response = state
        .auth
        .login(&payload.username_or_email, &payload.password)
        .await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = LoginResponse),
        (status = 401, description = "Refresh token expired or revoked", body = ErrorBody),
        (status = 404, description = "Refresh token unknown", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<LoginResponse>> {
    if payload.refresh_token.trim().is_empty() {
        return Err(AppError::Validation(HashMap::from([(
            "refreshToken".to_string(),
            "must not be blank".to_string(),
        )])));
    }
    let response = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(response))
}

/// Logout: delete every refresh credential of the authenticated user
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> Result<StatusCode> {
    state.auth.logout(&current.user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the authenticated user's summary
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_user(&current.user, current.authorities))
}

fn validate_register(payload: &RegisterRequest) -> Result<()> {
    let mut errors = HashMap::new();
    if payload.username.trim().len() < 3 {
        errors.insert(
            "username".to_string(),
            "must be at least 3 characters".to_string(),
        );
    }
    if !is_plausible_email(&payload.email) {
        errors.insert("email".to_string(), "must be a valid email".to_string());
    }
    if payload.password.len() < 8 {
        errors.insert(
            "password".to_string(),
            "must be at least 8 characters".to_string(),
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn validate_login(payload: &LoginRequest) -> Result<()> {
    let mut errors = HashMap::new();
    if payload.username_or_email.trim().is_empty() {
        errors.insert(
            "usernameOrEmail".to_string(),
            "must not be blank".to_string(),
        );
    }
    if payload.password.is_empty() {
        errors.insert("password".to_string(), "must not be blank".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation_collects_all_fields() {
        let payload = RegisterRequest {
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
        };
        let err = validate_register(&payload).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 3);
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_register_validation_accepts_good_input() {
        let payload = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Passw0rd!".to_string(),
        };
        assert!(validate_register(&payload).is_ok());
    }

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("a@b.co"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.co"));
        assert!(!is_plausible_email("a@.co"));
        assert!(!is_plausible_email("plain"));
    }
}
