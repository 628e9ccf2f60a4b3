use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BasePdfRenderer, PdfRenderOutcome, PdfRenderRequest};

/// PDF renderers keyed by list type id. List types without a renderer get no PDF.
#[derive(Clone, Default)]
pub struct PdfRendererRegistry {
    renderers: HashMap<i32, Arc<dyn BasePdfRenderer>>,
}

impl PdfRendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, list_type_id: i32, renderer: Arc<dyn BasePdfRenderer>) -> Self {
        self.renderers.insert(list_type_id, renderer);
        self
    }

    pub fn get(&self, list_type_id: i32) -> Option<Arc<dyn BasePdfRenderer>> {
        self.renderers.get(&list_type_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderBody<'a> {
    artefact_id: String,
    content_date: String,
    locale: &'a str,
    location_id: &'a str,
    json_data: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    provenance: Option<&'a str>,
}

/// Renders through the list-template service and stores the PDF on local disk
pub struct HttpPdfRenderer {
    client: Client,
    endpoint: String,
    storage_dir: PathBuf,
}

impl HttpPdfRenderer {
    /// `base_url` is the render service root; `list_type_id` selects its template
    pub fn new(base_url: &str, list_type_id: i32, storage_dir: PathBuf) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!(
                "{}/list-types/{}/pdf",
                base_url.trim_end_matches('/'),
                list_type_id
            ),
            storage_dir,
        }
    }
}

#[async_trait]
impl BasePdfRenderer for HttpPdfRenderer {
    async fn render(&self, request: &PdfRenderRequest) -> Result<PdfRenderOutcome> {
        let body = RenderBody {
            artefact_id: request.artefact_id.to_string(),
            content_date: request.content_date.to_rfc3339(),
            locale: &request.locale,
            location_id: &request.location_id,
            json_data: &request.json_data,
            provenance: request.provenance.as_deref(),
        };

        debug!(endpoint = %self.endpoint, artefact_id = %request.artefact_id, "Requesting PDF render");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("PDF render service unreachable")?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "PDF render service returned an error");
            return Ok(PdfRenderOutcome::failed(format!(
                "Render service returned {}: {}",
                status, message
            )));
        }

        let bytes = response.bytes().await.context("Failed to read rendered PDF")?;

        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.storage_dir.display()))?;
        let pdf_path = self.storage_dir.join(format!("{}.pdf", request.artefact_id));
        tokio::fs::write(&pdf_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", pdf_path.display()))?;

        Ok(PdfRenderOutcome::rendered(pdf_path, bytes.len() as u64))
    }
}
