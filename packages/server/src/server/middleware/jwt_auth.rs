use crate::common::{JwtService, Principal};
use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

/// JWT authentication middleware
///
/// Extracts JWT token from Authorization header, verifies it, and adds the
/// `Principal` to request extensions.
/// If no token or invalid token, request continues anonymously.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(principal) = extract_principal(&request, &jwt_service) {
        debug!(
            user_id = %principal.user_id,
            role = principal.role.map(|r| r.as_str()).unwrap_or("none"),
            "Authenticated user"
        );
        request.extensions_mut().insert(principal);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_principal(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<Principal> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = jwt_service.verify_token(token).ok()?;
    claims.to_principal().ok()
}
