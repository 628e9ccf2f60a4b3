use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::common::Locale;
use crate::domains::publications::{find_list_type, list_type_display_name, Publication};
use crate::server::app::AppState;
use crate::server::middleware::LocaleQuery;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationSummary {
    #[serde(flatten)]
    publication: Publication,
    list_type_name: String,
}

/// Publication metadata. The access gate has already put the publication in
/// request extensions.
pub async fn get_publication(
    Extension(publication): Extension<Publication>,
    query: Option<Query<LocaleQuery>>,
) -> Json<PublicationSummary> {
    let locale = Locale::from_code(query.as_ref().and_then(|Query(q)| q.lng.as_deref()));

    let list_type_name = match (find_list_type(publication.list_type_id), locale) {
        (Some(list_type), Locale::Welsh) => list_type.welsh_friendly_name.to_string(),
        _ => list_type_display_name(publication.list_type_id),
    };

    Json(PublicationSummary {
        publication,
        list_type_name,
    })
}

/// Publication content as uploaded
pub async fn get_publication_data(
    Extension(state): Extension<AppState>,
    Extension(publication): Extension<Publication>,
) -> Response {
    match state.deps.publications.find_payload(publication.artefact_id).await {
        Ok(Some(payload)) => Json(payload).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Publication has no content" })),
        )
            .into_response(),
        Err(e) => {
            error!(artefact_id = %publication.artefact_id, error = %e, "Failed to load publication content");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load publication content" })),
            )
                .into_response()
        }
    }
}
