//! Router harness backed by in-memory collaborators.
//!
//! Every test gets its own `TestDependencies`, so assertions can inspect the
//! notification log, sent emails and audit entries after driving the router.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use hearings_core::common::{JwtService, Principal, Provenance, UserRole};
use hearings_core::kernel::TestDependencies;
use hearings_core::server::{build_app, AppState};

const JWT_SECRET: &str = "integration-test-secret";
const JWT_ISSUER: &str = "integration-tests";

pub struct TestHarness {
    pub deps: TestDependencies,
    jwt: JwtService,
    router: Router,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    pub fn with_deps(deps: TestDependencies) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let jwt = JwtService::new(JWT_SECRET, JWT_ISSUER.to_string());
        let state = AppState::new(deps.server_deps(), jwt.clone(), None);
        let router = build_app(state, &[]);

        Self { deps, jwt, router }
    }

    pub fn principal(role: Option<UserRole>, provenance: Provenance) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: Some("user@justice.test".to_string()),
            role,
            provenance,
        }
    }

    pub fn token_for(&self, principal: &Principal) -> String {
        self.jwt
            .create_token(principal)
            .expect("Failed to create test token")
    }

    pub async fn get(&self, uri: &str, principal: Option<&Principal>) -> Response<Body> {
        self.send(Method::GET, uri, principal, None).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        principal: Option<&Principal>,
        body: Value,
    ) -> Response<Body> {
        self.send(Method::POST, uri, principal, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        principal: Option<&Principal>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(principal) = principal {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token_for(principal)),
            );
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router call failed")
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
