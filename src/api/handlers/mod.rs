/// Registration, login, refresh, logout, and current-user endpoints.
pub mod auth;
/// Administrative user-management endpoints.
pub mod users;

use crate::types::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use std::collections::HashMap;

/// JSON request-body extractor whose rejection renders the uniform
/// error body. axum's stock `Json` rejection is plain text and would
/// bypass the envelope entirely.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(HashMap::from([(
            "body".to_string(),
            rejection.body_text(),
        )]))
    }
}
