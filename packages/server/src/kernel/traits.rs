// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Access rules, fan-out and audit classification are domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BasePublicationStore, BaseEmailService)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

use crate::domains::audit::models::{AuditLogEntry, NewAuditLogEntry};
use crate::domains::locations::Location;
use crate::domains::notifications::models::NewNotificationLog;
use crate::domains::publications::Publication;
use crate::domains::subscriptions::Subscription;
use crate::domains::users::User;

// =============================================================================
// Stores (Infrastructure - lookups owned by other parts of the portal)
// =============================================================================

#[async_trait]
pub trait BasePublicationStore: Send + Sync {
    /// Publication metadata, `None` when the id is unknown
    async fn find_by_id(&self, artefact_id: Uuid) -> Result<Option<Publication>>;

    /// JSON content of a publication, `None` for flat files
    async fn find_payload(&self, artefact_id: Uuid) -> Result<Option<serde_json::Value>>;
}

#[async_trait]
pub trait BaseLocationStore: Send + Sync {
    async fn find_by_id(&self, location_id: i32) -> Result<Option<Location>>;
}

#[async_trait]
pub trait BaseSubscriptionStore: Send + Sync {
    async fn find_by_location(&self, location_id: i32) -> Result<Vec<Subscription>>;
}

#[async_trait]
pub trait BaseUserStore: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
}

// =============================================================================
// Notification Log Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseNotificationLogStore: Send + Sync {
    /// Open a row and return its id
    async fn create(&self, log: NewNotificationLog) -> Result<Uuid>;

    /// Pending -> Sent. Returns false when the row was already terminal.
    async fn mark_sent(&self, notification_id: Uuid, provider_message_id: &str) -> Result<bool>;

    /// Pending -> Failed. Returns false when the row was already terminal.
    async fn mark_failed(&self, notification_id: Uuid, error_message: &str) -> Result<bool>;
}

// =============================================================================
// Email Service Trait (Infrastructure - transactional email)
// =============================================================================

#[async_trait]
pub trait BaseEmailService: Send + Sync {
    /// Send a templated email, returning the provider's message id
    async fn send_email(
        &self,
        template_id: &str,
        email_address: &str,
        personalisation: serde_json::Value,
    ) -> Result<String>;
}

// =============================================================================
// PDF Rendering Trait (Infrastructure - one renderer per list type)
// =============================================================================

/// Input for rendering a publication as PDF
#[derive(Debug, Clone)]
pub struct PdfRenderRequest {
    pub artefact_id: Uuid,
    pub content_date: DateTime<Utc>,
    pub locale: String,
    pub location_id: String,
    pub json_data: serde_json::Value,
    pub provenance: Option<String>,
}

/// What a renderer reports back. `success == false` carries `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfRenderOutcome {
    pub success: bool,
    pub pdf_path: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    pub error: Option<String>,
}

impl PdfRenderOutcome {
    pub fn rendered(pdf_path: PathBuf, size_bytes: u64) -> Self {
        Self {
            success: true,
            pdf_path: Some(pdf_path),
            size_bytes: Some(size_bytes),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait BasePdfRenderer: Send + Sync {
    async fn render(&self, request: &PdfRenderRequest) -> Result<PdfRenderOutcome>;
}

// =============================================================================
// Audit Log Trait (Infrastructure - append-only)
// =============================================================================

#[async_trait]
pub trait BaseAuditLogStore: Send + Sync {
    async fn append(&self, entry: NewAuditLogEntry) -> Result<()>;

    /// Most recent entries first
    async fn recent(&self, limit: i64) -> Result<Vec<AuditLogEntry>>;
}
