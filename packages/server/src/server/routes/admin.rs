use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::domains::audit::{AuditContext, AuditHandle, Completion};
use crate::domains::publications::{
    list_type_display_name, process_publication_after_save, ProcessPublicationParams,
};
use crate::server::app::AppState;

const DEFAULT_AUDIT_PAGE_SIZE: i64 = 50;
const MAX_AUDIT_PAGE_SIZE: i64 = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessRequest {
    #[serde(default)]
    pub skip_notifications: bool,
}

/// Re-run PDF generation and subscriber emails for a saved publication
pub async fn reprocess_publication(
    Extension(state): Extension<AppState>,
    audit: Option<Extension<AuditHandle>>,
    Path(publication_id): Path<Uuid>,
    body: Option<Json<ReprocessRequest>>,
) -> Response {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let publication = match state.deps.publications.find_by_id(publication_id).await {
        Ok(Some(publication)) => publication,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Publication {} not found", publication_id) })),
            )
                .into_response()
        }
        Err(e) => {
            error!(artefact_id = %publication_id, error = %e, "Publication lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Flat files are stored as uploaded and never rendered
    let json_data = if publication.is_flat_file {
        None
    } else {
        match state.deps.publications.find_payload(publication_id).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(artefact_id = %publication_id, error = %e, "Publication payload lookup failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    };

    if let Some(Extension(audit)) = &audit {
        audit.set(
            AuditContext::new()
                .action("reprocessPublication")
                .entity(format!("Publication: {}", publication_id))
                .field("listType", list_type_display_name(publication.list_type_id))
                .field("locationId", publication.location_id.clone()),
        );
    }

    let locale = if publication.language.eq_ignore_ascii_case("WELSH") {
        "cy"
    } else {
        "en"
    };

    let params = ProcessPublicationParams {
        artefact_id: publication.artefact_id,
        location_id: publication.location_id.clone(),
        list_type_id: publication.list_type_id,
        content_date: publication.content_date,
        locale: locale.to_string(),
        json_data,
        provenance: Some(publication.provenance.to_string()),
        skip_notifications: request.skip_notifications,
    };

    let result = process_publication_after_save(params, &state.deps).await;

    info!(
        artefact_id = %publication_id,
        pdf = result.pdf_path.is_some(),
        sent = result.notifications_sent.unwrap_or_default(),
        failed = result.notifications_failed.unwrap_or_default(),
        "Publication reprocessed"
    );

    match serde_json::to_value(&result) {
        Ok(body) => Completion::Json(body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize processing result");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

/// Most recent audit entries, newest first
pub async fn audit_log_view(
    Extension(state): Extension<AppState>,
    query: Option<Query<AuditLogQuery>>,
) -> Response {
    let limit = query
        .and_then(|Query(q)| q.limit)
        .unwrap_or(DEFAULT_AUDIT_PAGE_SIZE)
        .clamp(1, MAX_AUDIT_PAGE_SIZE);

    match state.deps.audit_log.recent(limit).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load audit log");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
