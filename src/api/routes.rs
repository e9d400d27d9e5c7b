use crate::api::handlers;
use crate::auth::{auth_gate, role_gate, RolePolicy};
use crate::types::ErrorBody;
use crate::AppState;
use axum::{
    extract::Request,
    middleware,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi as _;

/// Assembles the full application router.
///
/// Layer order matters: on the way in a request passes CORS, tracing,
/// the error envelope, the auth gate, and the role gate before reaching
/// its handler. The envelope sits outside both gates so every rejection
/// they produce is stamped with the request path.
pub fn create_router(state: AppState) -> Router {
    let policy = Arc::new(RolePolicy::admin_defaults());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/admin/users/{id}/roles/admin",
            put(handlers::users::grant_admin_role),
        )
        .layer(middleware::from_fn_with_state(policy, role_gate))
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .layer(middleware::from_fn(error_envelope))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", crate::api::ApiDoc::openapi()),
    );

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route("/api-docs/openapi.json", get(openapi_json));

    router
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::api::ApiDoc::openapi())
}

/// Stamps the request path onto the uniform error body. `AppError`
/// renders the body and stashes it in the response extensions; only this
/// middleware knows which path the request targeted.
async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut response = next.run(req).await;

    if let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() {
        body.path = path;
        let status = response.status();
        return (status, Json(body)).into_response();
    }

    response
}
