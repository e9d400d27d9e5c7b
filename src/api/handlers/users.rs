use crate::{
    types::{AppError, ErrorBody, Result, UserResponse},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Grant the admin role to a user. Requires ROLE_ADMIN (enforced by the
/// role gate, not here).
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/roles/admin",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Role granted", body = UserResponse),
        (status = 403, description = "Caller lacks ROLE_ADMIN", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn grant_admin_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state
        .store
        .find_user_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", user_id)))?;

    state.store.add_role_to_user(&user.id, "ROLE_ADMIN").await?;

    let roles = state
        .store
        .roles_for_user(&user.id)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect();

    Ok(Json(UserResponse::from_user(&user, roles)))
}
