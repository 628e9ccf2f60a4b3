//! HTTP rendering of handler completions.
//!
//! The `Completion` travels on the response extensions so the audit
//! middleware can see how the handler finished.

use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::domains::audit::Completion;

impl IntoResponse for Completion {
    fn into_response(self) -> Response {
        let mut response = match &self {
            Completion::Redirect { location } => Redirect::to(location).into_response(),
            Completion::Render { view, model } => {
                Json(json!({ "view": view, "model": model })).into_response()
            }
            Completion::Json(body) => Json(body.clone()).into_response(),
            Completion::Send(body) => body.clone().into_response(),
        };
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn test_redirect_is_see_other() {
        let response = Completion::redirect("/system-admin-dashboard").into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/system-admin-dashboard"
        );
        assert!(response.extensions().get::<Completion>().is_some());
    }

    #[test]
    fn test_json_carries_completion() {
        let response = Completion::Json(json!({ "ok": true })).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.extensions().get::<Completion>(),
            Some(&Completion::Json(json!({ "ok": true })))
        );
    }
}
