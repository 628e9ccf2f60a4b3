use axum::{
    extract::{Extension, Path, Query, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

use crate::common::{Locale, Principal};
use crate::domains::publications::{require_publication, AccessError, AccessScope};
use crate::server::app::AppState;

/// Route parameter holding the artefact id
pub const PUBLICATION_ID_PARAM: &str = "publication_id";

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub lng: Option<String>,
}

/// `AccessError` rendered as a bilingual error page
pub struct AccessErrorResponse {
    pub error: AccessError,
    pub locale: Locale,
}

impl IntoResponse for AccessErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = json!({
            "error": {
                "status": status.as_u16(),
                "title": self.error.title(self.locale),
                "message": self.error.message(self.locale),
                "locale": self.locale.code(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        AccessErrorResponse {
            error: self,
            locale: Locale::English,
        }
        .into_response()
    }
}

/// Gate for routes showing publication metadata
pub async fn require_publication_metadata(
    Extension(state): Extension<AppState>,
    principal: Option<Extension<Principal>>,
    params: Option<Path<HashMap<String, String>>>,
    query: Option<Query<LocaleQuery>>,
    request: Request,
    next: Next,
) -> Response {
    guard(
        AccessScope::Metadata,
        &state,
        principal,
        params,
        query,
        request,
        next,
    )
    .await
}

/// Gate for routes showing publication content
pub async fn require_publication_content(
    Extension(state): Extension<AppState>,
    principal: Option<Extension<Principal>>,
    params: Option<Path<HashMap<String, String>>>,
    query: Option<Query<LocaleQuery>>,
    request: Request,
    next: Next,
) -> Response {
    guard(
        AccessScope::Data,
        &state,
        principal,
        params,
        query,
        request,
        next,
    )
    .await
}

async fn guard(
    scope: AccessScope,
    state: &AppState,
    principal: Option<Extension<Principal>>,
    params: Option<Path<HashMap<String, String>>>,
    query: Option<Query<LocaleQuery>>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = Locale::from_code(query.as_ref().and_then(|Query(q)| q.lng.as_deref()));
    let principal = principal.map(|Extension(p)| p);
    let publication_id = params
        .as_ref()
        .and_then(|Path(params)| params.get(PUBLICATION_ID_PARAM))
        .map(String::as_str);

    match require_publication(publication_id, principal.as_ref(), scope, &state.deps).await {
        Ok(publication) => {
            request.extensions_mut().insert(publication);
            next.run(request).await
        }
        Err(error) => AccessErrorResponse { error, locale }.into_response(),
    }
}
