//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::common::JwtService;
use crate::domains::audit::AUDIT_LOG_VIEW_PATH;
use crate::kernel::ServerDeps;
use crate::server::middleware::{
    audit_trail_middleware, jwt_auth_middleware, require_publication_content,
    require_publication_metadata, require_system_admin,
};
use crate::server::routes::{
    audit_log_view, get_publication, get_publication_data, health_handler, reprocess_publication,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub jwt_service: Arc<JwtService>,
    /// `None` when running against in-memory stores
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(deps: ServerDeps, jwt_service: JwtService, db_pool: Option<PgPool>) -> Self {
        Self {
            deps: Arc::new(deps),
            jwt_service: Arc::new(jwt_service),
            db_pool,
        }
    }
}

/// Build the Axum application router
///
/// Empty `allowed_origins` allows any origin.
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let metadata_routes = Router::new()
        .route("/api/publications/:publication_id", get(get_publication))
        .route_layer(middleware::from_fn(require_publication_metadata));

    let content_routes = Router::new()
        .route(
            "/api/publications/:publication_id/data",
            get(get_publication_data),
        )
        .route_layer(middleware::from_fn(require_publication_content));

    let admin_routes = Router::new()
        .route(
            "/api/admin/publications/:publication_id/reprocess",
            post(reprocess_publication),
        )
        .route(AUDIT_LOG_VIEW_PATH, get(audit_log_view))
        .route_layer(middleware::from_fn(require_system_admin));

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ))
    }
    .allow_methods([Method::GET, Method::POST])
    .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let jwt_service = state.jwt_service.clone();

    Router::new()
        .route("/health", get(health_handler))
        .merge(metadata_routes)
        .merge(content_routes)
        .merge(admin_routes)
        // Middleware layers (applied in reverse order - last added runs first)
        .route_layer(middleware::from_fn(audit_trail_middleware))
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(cors)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}
