use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::list_types::list_type_display_name;
use crate::domains::notifications::{
    send_publication_notifications, NotificationResult, PublicationNotificationRequest,
};
use crate::kernel::{PdfRenderOutcome, PdfRenderRequest, ServerDeps};

/// Size above which a PDF is flagged. Informational only: nothing is blocked.
pub const MAX_PDF_SIZE_BYTES: u64 = 2 * 1024 * 1024;

/// A publication that has just been saved
#[derive(Debug, Clone)]
pub struct ProcessPublicationParams {
    pub artefact_id: Uuid,
    pub location_id: String,
    pub list_type_id: i32,
    pub content_date: DateTime<Utc>,
    pub locale: String,
    /// Absent for flat-file uploads, which never get a PDF
    pub json_data: Option<Value>,
    pub provenance: Option<String>,
    pub skip_notifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPublicationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_exceeds_max_size: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_sent: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_result: Option<NotificationResult>,
}

#[derive(Debug)]
struct RenderedPdf {
    path: PathBuf,
    size_bytes: u64,
}

/// Finish processing a saved publication: render the PDF, then email subscribers.
///
/// Neither step can fail the publish. Problems are logged and show up as
/// missing fields or counts in the result.
#[instrument(
    skip(params, deps),
    fields(artefact_id = %params.artefact_id, list_type_id = params.list_type_id)
)]
pub async fn process_publication_after_save(
    params: ProcessPublicationParams,
    deps: &ServerDeps,
) -> ProcessPublicationResult {
    let mut result = ProcessPublicationResult::default();

    match &params.json_data {
        Some(json_data) => {
            if let Some(pdf) = generate_pdf(&params, json_data, deps).await {
                let exceeds = pdf.size_bytes > MAX_PDF_SIZE_BYTES;
                if exceeds {
                    info!(size_bytes = pdf.size_bytes, "PDF exceeds maximum attachment size");
                }
                result.pdf_path = Some(pdf.path);
                result.pdf_size_bytes = Some(pdf.size_bytes);
                result.pdf_exceeds_max_size = Some(exceeds);
            }
        }
        None => debug!("No JSON data, skipping PDF generation"),
    }

    if params.skip_notifications {
        debug!("Notifications skipped for this publication");
        return result;
    }

    let notification = notify_subscribers(&params, result.pdf_path.clone(), deps).await;
    result.notifications_sent = Some(notification.sent_count);
    result.notifications_failed = Some(notification.failed_count);
    result.notification_result = Some(notification);

    result
}

async fn generate_pdf(
    params: &ProcessPublicationParams,
    json_data: &Value,
    deps: &ServerDeps,
) -> Option<RenderedPdf> {
    let Some(renderer) = deps.pdf_renderers.get(params.list_type_id) else {
        debug!("No PDF renderer for list type");
        return None;
    };

    let request = PdfRenderRequest {
        artefact_id: params.artefact_id,
        content_date: params.content_date,
        locale: params.locale.clone(),
        location_id: params.location_id.clone(),
        json_data: json_data.clone(),
        provenance: params.provenance.clone(),
    };

    let outcome = AssertUnwindSafe(renderer.render(&request))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(PdfRenderOutcome {
            success: true,
            pdf_path: Some(path),
            size_bytes,
            ..
        })) => {
            let size_bytes = match size_bytes {
                Some(size) => size,
                None => tokio::fs::metadata(&path)
                    .await
                    .map(|m| m.len())
                    .unwrap_or_default(),
            };
            info!(path = %path.display(), size_bytes, "PDF generated");
            Some(RenderedPdf { path, size_bytes })
        }
        Ok(Ok(rendered)) => {
            warn!(
                error = rendered.error.as_deref().unwrap_or("no PDF produced"),
                "PDF generation failed"
            );
            None
        }
        Ok(Err(e)) => {
            error!(error = %e, "PDF renderer returned an error");
            None
        }
        Err(_) => {
            error!("PDF renderer panicked");
            None
        }
    }
}

async fn notify_subscribers(
    params: &ProcessPublicationParams,
    pdf_file_path: Option<PathBuf>,
    deps: &ServerDeps,
) -> NotificationResult {
    let Ok(location_id) = params.location_id.trim().parse::<i32>() else {
        warn!(location_id = %params.location_id, "Non-numeric location id, skipping notifications");
        return NotificationResult::precondition_failed(format!(
            "Invalid location id: {}",
            params.location_id
        ));
    };

    let location = match deps.locations.find_by_id(location_id).await {
        Ok(Some(location)) => location,
        Ok(None) => {
            warn!(location_id, "Location not found, skipping notifications");
            return NotificationResult::precondition_failed(format!(
                "Location {} not found",
                location_id
            ));
        }
        Err(e) => {
            error!(location_id, error = %e, "Location lookup failed");
            return NotificationResult::precondition_failed(format!(
                "Location lookup failed: {}",
                e
            ));
        }
    };

    let request = PublicationNotificationRequest {
        publication_id: params.artefact_id,
        location_id,
        location_name: location.name,
        list_type_name: list_type_display_name(params.list_type_id),
        publication_date: params.content_date,
        pdf_file_path,
    };

    send_publication_notifications(&request, deps).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{test_location, MockPdfRenderer, PdfBehaviour};
    use crate::kernel::TestDependencies;
    use chrono::TimeZone;
    use std::sync::Arc;

    const LIST_TYPE_ID: i32 = 3;
    const LOCATION_ID: i32 = 9;

    fn params() -> ProcessPublicationParams {
        ProcessPublicationParams {
            artefact_id: Uuid::new_v4(),
            location_id: LOCATION_ID.to_string(),
            list_type_id: LIST_TYPE_ID,
            content_date: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            locale: "en".to_string(),
            json_data: Some(serde_json::json!({ "courtLists": [] })),
            provenance: Some("MANUAL_UPLOAD".to_string()),
            skip_notifications: false,
        }
    }

    fn deps_with(renderer: Arc<MockPdfRenderer>) -> TestDependencies {
        let deps = TestDependencies::new().with_pdf_renderer(LIST_TYPE_ID, renderer);
        deps.locations
            .insert(test_location(LOCATION_ID, "Oxford Combined Court"));
        deps.add_subscriber(LOCATION_ID, Some("a@example.com"));
        deps
    }

    #[tokio::test]
    async fn test_renders_pdf_and_notifies() {
        let renderer = Arc::new(MockPdfRenderer::rendering("/tmp/list.pdf", 1024));
        let deps = deps_with(renderer.clone());

        let result = process_publication_after_save(params(), &deps.server_deps()).await;

        assert_eq!(result.pdf_path, Some(PathBuf::from("/tmp/list.pdf")));
        assert_eq!(result.pdf_size_bytes, Some(1024));
        assert_eq!(result.pdf_exceeds_max_size, Some(false));
        assert_eq!(result.notifications_sent, Some(1));
        assert_eq!(result.notifications_failed, Some(0));

        let request = renderer.last_request().unwrap();
        assert_eq!(request.location_id, "9");
        assert_eq!(request.provenance.as_deref(), Some("MANUAL_UPLOAD"));

        let sent = deps.email.sent();
        assert_eq!(sent[0].personalisation["ListType"], "Crown Daily List");
        assert_eq!(sent[0].personalisation["locations"], "Oxford Combined Court");
    }

    #[tokio::test]
    async fn test_no_json_skips_pdf() {
        let renderer = Arc::new(MockPdfRenderer::rendering("/tmp/list.pdf", 1024));
        let deps = deps_with(renderer.clone());
        let mut p = params();
        p.json_data = None;

        let result = process_publication_after_save(p, &deps.server_deps()).await;

        assert_eq!(renderer.call_count(), 0);
        assert_eq!(result.pdf_path, None);
        assert_eq!(result.notifications_sent, Some(1));
    }

    #[tokio::test]
    async fn test_unsupported_list_type_has_no_pdf() {
        let renderer = Arc::new(MockPdfRenderer::rendering("/tmp/list.pdf", 1024));
        let deps = deps_with(renderer.clone());
        let mut p = params();
        p.list_type_id = 42;

        let result = process_publication_after_save(p, &deps.server_deps()).await;

        assert_eq!(renderer.call_count(), 0);
        assert_eq!(result.pdf_path, None);
        assert_eq!(result.notifications_sent, Some(1));
        assert_eq!(deps.email.sent()[0].personalisation["ListType"], "LIST_TYPE_42");
    }

    #[tokio::test]
    async fn test_oversized_pdf_only_flagged() {
        let renderer = Arc::new(MockPdfRenderer::rendering(
            "/tmp/big.pdf",
            MAX_PDF_SIZE_BYTES + 1,
        ));
        let deps = deps_with(renderer);

        let result = process_publication_after_save(params(), &deps.server_deps()).await;

        assert_eq!(result.pdf_exceeds_max_size, Some(true));
        assert_eq!(result.notifications_sent, Some(1));
    }

    #[tokio::test]
    async fn test_renderer_failures_never_propagate() {
        for behaviour in [
            PdfBehaviour::Fail("template error".to_string()),
            PdfBehaviour::Error("render service down".to_string()),
            PdfBehaviour::Panic,
        ] {
            let renderer = Arc::new(MockPdfRenderer::new(behaviour));
            let deps = deps_with(renderer.clone());

            let result = process_publication_after_save(params(), &deps.server_deps()).await;

            assert_eq!(renderer.call_count(), 1);
            assert_eq!(result.pdf_path, None);
            assert_eq!(result.pdf_exceeds_max_size, None);
            assert_eq!(result.notifications_sent, Some(1));
        }
    }

    #[tokio::test]
    async fn test_non_numeric_location_fails_notifications_only() {
        let renderer = Arc::new(MockPdfRenderer::rendering("/tmp/list.pdf", 1024));
        let deps = deps_with(renderer.clone());
        let mut p = params();
        p.location_id = "abc".to_string();

        let result = process_publication_after_save(p, &deps.server_deps()).await;

        assert_eq!(result.pdf_path, Some(PathBuf::from("/tmp/list.pdf")));
        let notification = result.notification_result.unwrap();
        assert!(!notification.success);
        assert_eq!(notification.sent_count, 0);
        assert!(deps.email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_location_fails_notifications() {
        let renderer = Arc::new(MockPdfRenderer::rendering("/tmp/list.pdf", 1024));
        let deps = deps_with(renderer);
        let mut p = params();
        p.location_id = "404".to_string();

        let result = process_publication_after_save(p, &deps.server_deps()).await;

        assert!(!result.notification_result.unwrap().success);
        assert!(deps.email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_skip_notifications() {
        let renderer = Arc::new(MockPdfRenderer::rendering("/tmp/list.pdf", 1024));
        let deps = deps_with(renderer);
        let mut p = params();
        p.skip_notifications = true;

        let result = process_publication_after_save(p, &deps.server_deps()).await;

        assert!(result.pdf_path.is_some());
        assert_eq!(result.notification_result, None);
        assert_eq!(result.notifications_sent, None);
        assert!(deps.email.sent().is_empty());
    }
}
