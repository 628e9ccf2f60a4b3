use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::common::{AuthError, Principal};

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::AuthenticationRequired | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::SystemAdminRequired | AuthError::UnknownRole(_) => StatusCode::FORBIDDEN,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Reject anyone who is not a SYSTEM_ADMIN
pub async fn require_system_admin(
    principal: Option<Extension<Principal>>,
    request: Request,
    next: Next,
) -> Response {
    match principal {
        None => AuthError::AuthenticationRequired.into_response(),
        Some(Extension(p)) if !p.is_system_admin() => {
            debug!(user_id = %p.user_id, path = %request.uri().path(), "System admin required");
            AuthError::SystemAdminRequired.into_response()
        }
        Some(_) => next.run(request).await,
    }
}
