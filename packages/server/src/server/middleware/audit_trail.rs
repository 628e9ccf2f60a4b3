use axum::{
    body::{Body, Bytes},
    extract::{Extension, RawPathParams, Request},
    http::{header, HeaderMap, Response as HttpResponse, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::common::Principal;
use crate::domains::audit::{
    should_audit, AuditTrailRecorder, Completion, RequestSnapshot, ResponseObserver, SessionData,
};
use crate::server::app::AppState;

/// Largest request body buffered for an audited request
pub const MAX_AUDITED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Audit mutating SYSTEM_ADMIN requests.
///
/// The body is buffered so the recorder can read form fields, then handed on
/// unchanged. The handler's response is returned as is whatever happens to
/// the audit write.
pub async fn audit_trail_middleware(
    Extension(state): Extension<AppState>,
    principal: Option<Extension<Principal>>,
    params: Option<RawPathParams>,
    request: Request,
    next: Next,
) -> Response {
    let principal = principal.map(|Extension(p)| p);
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    let principal = match principal {
        Some(p) if should_audit(&method, Some(&p), &path) => p,
        _ => return next.run(request).await,
    };

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, limit = MAX_AUDITED_BODY_BYTES, "Could not read request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let snapshot = RequestSnapshot {
        method,
        path,
        body: parse_body(&parts.headers, &bytes),
        route_params: params
            .map(|params| {
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
        session: parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .unwrap_or_default(),
    };

    let recorder = AuditTrailRecorder::new(principal, snapshot, state.deps.audit_log.clone());

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(recorder.handle());

    let response = next.run(request).await;

    let recorder = match response.extensions().get::<SessionData>() {
        Some(session) => recorder.with_session(session.clone()),
        None => recorder,
    };

    match completion_of(&response) {
        Some(completion) => recorder.on_complete(&completion).await,
        None => debug!(status = %response.status(), "Response has no auditable completion"),
    }

    response
}

/// How the handler finished. Handlers returning a `Completion` say so
/// directly; anything else is read from the status line.
fn completion_of<B>(response: &HttpResponse<B>) -> Option<Completion> {
    if let Some(completion) = response.extensions().get::<Completion>() {
        return Some(completion.clone());
    }

    let status = response.status();
    if status.is_redirection() {
        let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
        return Some(Completion::redirect(location));
    }
    if status.is_success() {
        return Some(Completion::Send(String::new()));
    }
    None
}

fn parse_body(headers: &HeaderMap, bytes: &Bytes) -> Map<String, Value> {
    if bytes.is_empty() {
        return Map::new();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        return match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return url::form_urlencoded::parse(bytes)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
    }

    Map::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_parse_form_body() {
        let body = Bytes::from_static(b"name=Oxford+Court&welshName=Llys+Rhydychen");
        let map = parse_body(&headers("application/x-www-form-urlencoded"), &body);

        assert_eq!(map["name"], "Oxford Court");
        assert_eq!(map["welshName"], "Llys Rhydychen");
    }

    #[test]
    fn test_parse_json_body() {
        let body = Bytes::from_static(br#"{"locationId": 9}"#);
        let map = parse_body(&headers("application/json; charset=utf-8"), &body);
        assert_eq!(map["locationId"], 9);
    }

    #[test]
    fn test_unparseable_body_is_empty() {
        let body = Bytes::from_static(b"[1,2]");
        assert!(parse_body(&headers("application/json"), &body).is_empty());
        assert!(parse_body(&headers("text/plain"), &Bytes::from_static(b"hi")).is_empty());
    }

    #[test]
    fn test_completion_from_plain_responses() {
        let redirect = HttpResponse::builder()
            .status(StatusCode::FOUND)
            .header(header::LOCATION, "/add-court")
            .body(())
            .unwrap();
        assert_eq!(
            completion_of(&redirect),
            Some(Completion::redirect("/add-court"))
        );

        let ok = HttpResponse::builder().status(StatusCode::OK).body(()).unwrap();
        assert_eq!(completion_of(&ok), Some(Completion::Send(String::new())));

        let not_found = HttpResponse::builder()
            .status(StatusCode::NOT_FOUND)
            .body(())
            .unwrap();
        assert_eq!(completion_of(&not_found), None);
    }
}
