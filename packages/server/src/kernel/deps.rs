//! Server dependencies for domain functions (using traits for testability)
//!
//! This module provides the central dependency container used by the access gate,
//! the publication processor, the notification dispatcher and the audit trail.
//! All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use gov_notify::NotifyService;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domains::audit::models::{AuditLogEntry, NewAuditLogEntry};
use crate::domains::locations::Location;
use crate::domains::notifications::models::{NewNotificationLog, NotificationLog};
use crate::domains::notifications::NotificationSettings;
use crate::domains::publications::Publication;
use crate::domains::subscriptions::Subscription;
use crate::domains::users::User;
use crate::kernel::{
    BaseAuditLogStore, BaseEmailService, BaseLocationStore, BaseNotificationLogStore,
    BasePublicationStore, BaseSubscriptionStore, BaseUserStore, PdfRendererRegistry,
};

// =============================================================================
// NotifyService Adapter (implements BaseEmailService trait)
// =============================================================================

/// Wrapper around NotifyService that implements BaseEmailService trait
pub struct NotifyAdapter(pub Arc<NotifyService>);

impl NotifyAdapter {
    pub fn new(service: Arc<NotifyService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseEmailService for NotifyAdapter {
    async fn send_email(
        &self,
        template_id: &str,
        email_address: &str,
        personalisation: serde_json::Value,
    ) -> Result<String> {
        let reference = Uuid::new_v4().to_string();
        self.0
            .send_email(template_id, email_address, personalisation, Some(&reference))
            .await
            .map(|response| response.id)
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// Postgres Store (implements the store traits over the model queries)
// =============================================================================

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BasePublicationStore for PostgresStore {
    async fn find_by_id(&self, artefact_id: Uuid) -> Result<Option<Publication>> {
        Publication::find_by_id(artefact_id, &self.pool).await
    }

    async fn find_payload(&self, artefact_id: Uuid) -> Result<Option<serde_json::Value>> {
        Publication::find_payload(artefact_id, &self.pool).await
    }
}

#[async_trait]
impl BaseLocationStore for PostgresStore {
    async fn find_by_id(&self, location_id: i32) -> Result<Option<Location>> {
        Location::find_by_id(location_id, &self.pool).await
    }
}

#[async_trait]
impl BaseSubscriptionStore for PostgresStore {
    async fn find_by_location(&self, location_id: i32) -> Result<Vec<Subscription>> {
        Subscription::find_by_location(location_id, &self.pool).await
    }
}

#[async_trait]
impl BaseUserStore for PostgresStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        User::find_by_id(user_id, &self.pool).await
    }
}

#[async_trait]
impl BaseNotificationLogStore for PostgresStore {
    async fn create(&self, log: NewNotificationLog) -> Result<Uuid> {
        NotificationLog::create(&log, &self.pool)
            .await
            .map(|created| created.notification_id)
    }

    async fn mark_sent(&self, notification_id: Uuid, provider_message_id: &str) -> Result<bool> {
        NotificationLog::mark_sent(notification_id, provider_message_id, &self.pool).await
    }

    async fn mark_failed(&self, notification_id: Uuid, error_message: &str) -> Result<bool> {
        NotificationLog::mark_failed(notification_id, error_message, &self.pool).await
    }
}

#[async_trait]
impl BaseAuditLogStore for PostgresStore {
    async fn append(&self, entry: NewAuditLogEntry) -> Result<()> {
        AuditLogEntry::create(&entry, &self.pool).await.map(|_| ())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AuditLogEntry>> {
        AuditLogEntry::find_recent(limit, &self.pool).await
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain functions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub publications: Arc<dyn BasePublicationStore>,
    pub locations: Arc<dyn BaseLocationStore>,
    pub subscriptions: Arc<dyn BaseSubscriptionStore>,
    pub users: Arc<dyn BaseUserStore>,
    pub notification_logs: Arc<dyn BaseNotificationLogStore>,
    pub email: Arc<dyn BaseEmailService>,
    /// PDF renderers keyed by list type id
    pub pdf_renderers: PdfRendererRegistry,
    pub audit_log: Arc<dyn BaseAuditLogStore>,
    pub notification_settings: NotificationSettings,
}

impl ServerDeps {
    /// Wire every store to the same Postgres pool
    pub fn postgres(
        pool: PgPool,
        email: Arc<dyn BaseEmailService>,
        pdf_renderers: PdfRendererRegistry,
        notification_settings: NotificationSettings,
    ) -> Self {
        let store = Arc::new(PostgresStore::new(pool));

        Self {
            publications: store.clone(),
            locations: store.clone(),
            subscriptions: store.clone(),
            users: store.clone(),
            notification_logs: store.clone(),
            email,
            pdf_renderers,
            audit_log: store,
            notification_settings,
        }
    }
}
