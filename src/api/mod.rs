//! HTTP surface: route assembly, handlers, and OpenAPI documentation.

/// Request handlers, grouped by concern.
pub mod handlers;
/// Router assembly and the error envelope middleware.
pub mod routes;

use crate::types::{ErrorBody, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest, UserResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::users::grant_admin_role,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        LoginResponse,
        UserResponse,
        ErrorBody,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication and session endpoints"),
        (name = "admin", description = "Administrative endpoints, role-gated"),
    )
)]
/// The OpenAPI document covering every endpoint and schema.
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
