// TestDependencies - mock implementations for testing
//
// Provides in-memory stores and recording services that can be injected
// into ServerDeps for unit and router tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{
    BaseAuditLogStore, BaseEmailService, BaseLocationStore, BaseNotificationLogStore,
    BasePdfRenderer, BasePublicationStore, BaseSubscriptionStore, BaseUserStore,
    PdfRenderOutcome, PdfRenderRequest, PdfRendererRegistry, ServerDeps,
};
use crate::common::Provenance;
use crate::domains::audit::models::{AuditLogEntry, NewAuditLogEntry};
use crate::domains::locations::Location;
use crate::domains::notifications::models::{NewNotificationLog, NotificationStatus};
use crate::domains::notifications::NotificationSettings;
use crate::domains::publications::{Publication, Sensitivity};
use crate::domains::subscriptions::Subscription;
use crate::domains::users::User;

// =============================================================================
// Fixtures
// =============================================================================

pub fn test_publication(sensitivity: Sensitivity, provenance: Provenance) -> Publication {
    let content_date = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
    Publication {
        artefact_id: Uuid::new_v4(),
        location_id: "9".to_string(),
        list_type_id: 6,
        content_date,
        sensitivity,
        language: "ENGLISH".to_string(),
        display_from: content_date - Duration::days(1),
        display_to: content_date + Duration::days(1),
        provenance,
        is_flat_file: false,
        last_received_date: content_date - Duration::days(1),
    }
}

pub fn test_location(location_id: i32, name: &str) -> Location {
    Location {
        location_id,
        name: name.to_string(),
        welsh_name: None,
    }
}

pub fn test_user(email: Option<&str>) -> User {
    User {
        user_id: Uuid::new_v4(),
        email: email.map(str::to_string),
        user_provenance: "B2C_IDAM".to_string(),
        role: Some("VERIFIED".to_string()),
    }
}

pub fn test_subscription(user_id: Uuid, location_id: i32) -> Subscription {
    Subscription {
        subscription_id: Uuid::new_v4(),
        user_id,
        location_id,
        date_added: Utc::now(),
    }
}

// =============================================================================
// Mock Stores
// =============================================================================

#[derive(Default)]
pub struct MockPublicationStore {
    publications: Mutex<HashMap<Uuid, Publication>>,
    payloads: Mutex<HashMap<Uuid, serde_json::Value>>,
    fail: Mutex<bool>,
    lookups: AtomicUsize,
}

impl MockPublicationStore {
    pub fn insert(&self, publication: Publication) {
        self.publications
            .lock()
            .unwrap()
            .insert(publication.artefact_id, publication);
    }

    pub fn insert_payload(&self, artefact_id: Uuid, payload: serde_json::Value) {
        self.payloads.lock().unwrap().insert(artefact_id, payload);
    }

    /// Make every lookup return an error
    pub fn fail_lookups(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BasePublicationStore for MockPublicationStore {
    async fn find_by_id(&self, artefact_id: Uuid) -> Result<Option<Publication>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            anyhow::bail!("connection refused");
        }
        Ok(self.publications.lock().unwrap().get(&artefact_id).cloned())
    }

    async fn find_payload(&self, artefact_id: Uuid) -> Result<Option<serde_json::Value>> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("connection refused");
        }
        Ok(self.payloads.lock().unwrap().get(&artefact_id).cloned())
    }
}

#[derive(Default)]
pub struct MockLocationStore {
    locations: Mutex<HashMap<i32, Location>>,
}

impl MockLocationStore {
    pub fn insert(&self, location: Location) {
        self.locations
            .lock()
            .unwrap()
            .insert(location.location_id, location);
    }
}

#[async_trait]
impl BaseLocationStore for MockLocationStore {
    async fn find_by_id(&self, location_id: i32) -> Result<Option<Location>> {
        Ok(self.locations.lock().unwrap().get(&location_id).cloned())
    }
}

#[derive(Default)]
pub struct MockSubscriptionStore {
    subscriptions: Mutex<Vec<Subscription>>,
    fail: Mutex<bool>,
}

impl MockSubscriptionStore {
    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions.lock().unwrap().push(subscription);
    }

    pub fn fail_lookups(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl BaseSubscriptionStore for MockSubscriptionStore {
    async fn find_by_location(&self, location_id: i32) -> Result<Vec<Subscription>> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("subscriptions table unavailable");
        }
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.location_id == location_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    failing: Mutex<Vec<Uuid>>,
}

impl MockUserStore {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id, user);
    }

    /// Make lookups of `user_id` return an error
    pub fn fail_lookup_of(&self, user_id: Uuid) {
        self.failing.lock().unwrap().push(user_id);
    }
}

#[async_trait]
impl BaseUserStore for MockUserStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        if self.failing.lock().unwrap().contains(&user_id) {
            anyhow::bail!("users lookup timed out");
        }
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}

// =============================================================================
// Mock Notification Log
// =============================================================================

/// A notification log row as held by the mock store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotificationLog {
    pub notification_id: Uuid,
    pub publication_id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub status: NotificationStatus,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    /// Number of times a terminal transition was requested on this row
    pub transitions: usize,
}

#[derive(Default)]
pub struct MockNotificationLogStore {
    rows: Mutex<Vec<RecordedNotificationLog>>,
    fail_pending: Mutex<bool>,
}

impl MockNotificationLogStore {
    /// Reject inserts of Pending rows; Failed rows are still accepted
    pub fn fail_pending_creates(&self) {
        *self.fail_pending.lock().unwrap() = true;
    }

    pub fn rows(&self) -> Vec<RecordedNotificationLog> {
        self.rows.lock().unwrap().clone()
    }

    pub fn rows_with_status(&self, status: NotificationStatus) -> Vec<RecordedNotificationLog> {
        self.rows()
            .into_iter()
            .filter(|row| row.status == status)
            .collect()
    }

    fn transition(
        &self,
        notification_id: Uuid,
        status: NotificationStatus,
        message_id: Option<&str>,
        error: Option<&str>,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.notification_id == notification_id)
            .ok_or_else(|| anyhow::anyhow!("notification {} not found", notification_id))?;

        row.transitions += 1;
        if row.status.is_terminal() {
            return Ok(false);
        }

        row.status = status;
        row.provider_message_id = message_id.map(str::to_string);
        row.error_message = error.map(str::to_string);
        Ok(true)
    }
}

#[async_trait]
impl BaseNotificationLogStore for MockNotificationLogStore {
    async fn create(&self, log: NewNotificationLog) -> Result<Uuid> {
        if log.status == NotificationStatus::Pending && *self.fail_pending.lock().unwrap() {
            anyhow::bail!("notification_logs insert failed");
        }
        let notification_id = Uuid::new_v4();
        self.rows.lock().unwrap().push(RecordedNotificationLog {
            notification_id,
            publication_id: log.publication_id,
            subscription_id: log.subscription_id,
            user_id: log.user_id,
            status: log.status,
            provider_message_id: None,
            error_message: log.error_message,
            transitions: 0,
        });
        Ok(notification_id)
    }

    async fn mark_sent(&self, notification_id: Uuid, provider_message_id: &str) -> Result<bool> {
        self.transition(
            notification_id,
            NotificationStatus::Sent,
            Some(provider_message_id),
            None,
        )
    }

    async fn mark_failed(&self, notification_id: Uuid, error_message: &str) -> Result<bool> {
        self.transition(
            notification_id,
            NotificationStatus::Failed,
            None,
            Some(error_message),
        )
    }
}

// =============================================================================
// Mock Email Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub template_id: String,
    pub email_address: String,
    pub personalisation: serde_json::Value,
}

#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<SentEmail>>,
    failures: Mutex<HashMap<String, String>>,
    counter: AtomicUsize,
}

impl MockEmailService {
    /// Make sends to `email_address` fail with `error`
    pub fn fail_for(&self, email_address: &str, error: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(email_address.to_string(), error.to_string());
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, email_address: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|email| email.email_address == email_address)
            .count()
    }
}

#[async_trait]
impl BaseEmailService for MockEmailService {
    async fn send_email(
        &self,
        template_id: &str,
        email_address: &str,
        personalisation: serde_json::Value,
    ) -> Result<String> {
        if let Some(error) = self.failures.lock().unwrap().get(email_address) {
            anyhow::bail!("{}", error);
        }

        self.sent.lock().unwrap().push(SentEmail {
            template_id: template_id.to_string(),
            email_address: email_address.to_string(),
            personalisation,
        });

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("msg-{}", n + 1))
    }
}

// =============================================================================
// Mock PDF Renderer
// =============================================================================

#[derive(Debug, Clone)]
pub enum PdfBehaviour {
    Render { pdf_path: PathBuf, size_bytes: u64 },
    /// Renderer reports `success: false`
    Fail(String),
    /// Renderer returns an error
    Error(String),
    Panic,
}

pub struct MockPdfRenderer {
    behaviour: PdfBehaviour,
    requests: Mutex<Vec<PdfRenderRequest>>,
}

impl MockPdfRenderer {
    pub fn new(behaviour: PdfBehaviour) -> Self {
        Self {
            behaviour,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rendering(pdf_path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self::new(PdfBehaviour::Render {
            pdf_path: pdf_path.into(),
            size_bytes,
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<PdfRenderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl BasePdfRenderer for MockPdfRenderer {
    async fn render(&self, request: &PdfRenderRequest) -> Result<PdfRenderOutcome> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.behaviour {
            PdfBehaviour::Render {
                pdf_path,
                size_bytes,
            } => Ok(PdfRenderOutcome::rendered(pdf_path.clone(), *size_bytes)),
            PdfBehaviour::Fail(error) => Ok(PdfRenderOutcome::failed(error.clone())),
            PdfBehaviour::Error(error) => Err(anyhow::anyhow!("{}", error)),
            PdfBehaviour::Panic => panic!("renderer crashed"),
        }
    }
}

// =============================================================================
// Mock Audit Log
// =============================================================================

#[derive(Default)]
pub struct MockAuditLogStore {
    entries: Mutex<Vec<NewAuditLogEntry>>,
    fail: Mutex<bool>,
}

impl MockAuditLogStore {
    pub fn entries(&self) -> Vec<NewAuditLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn fail_writes(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl BaseAuditLogStore for MockAuditLogStore {
    async fn append(&self, entry: NewAuditLogEntry) -> Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("audit_logs insert failed");
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AuditLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|entry| AuditLogEntry {
                id: Uuid::new_v4(),
                user_id: entry.user_id,
                user_email: entry.user_email.clone(),
                user_role: entry.user_role.clone(),
                user_provenance: entry.user_provenance.clone(),
                action: entry.action.clone(),
                outcome: entry.outcome.as_str().to_string(),
                details: entry.details.clone(),
                created_at: Utc::now(),
            })
            .collect())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock collaborators plus the `ServerDeps` built from them.
///
/// Keep the `TestDependencies` around to inspect what the code under test did.
pub struct TestDependencies {
    pub publications: Arc<MockPublicationStore>,
    pub locations: Arc<MockLocationStore>,
    pub subscriptions: Arc<MockSubscriptionStore>,
    pub users: Arc<MockUserStore>,
    pub notification_logs: Arc<MockNotificationLogStore>,
    pub email: Arc<MockEmailService>,
    pub audit_log: Arc<MockAuditLogStore>,
    pub pdf_renderers: PdfRendererRegistry,
    pub notification_settings: NotificationSettings,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            publications: Arc::new(MockPublicationStore::default()),
            locations: Arc::new(MockLocationStore::default()),
            subscriptions: Arc::new(MockSubscriptionStore::default()),
            users: Arc::new(MockUserStore::default()),
            notification_logs: Arc::new(MockNotificationLogStore::default()),
            email: Arc::new(MockEmailService::default()),
            audit_log: Arc::new(MockAuditLogStore::default()),
            pdf_renderers: PdfRendererRegistry::new(),
            notification_settings: NotificationSettings {
                template_id: "publication-template".to_string(),
                template_id_with_file: Some("publication-with-file-template".to_string()),
                base_url: "https://hearings.test".to_string(),
                concurrency: 4,
            },
        }
    }

    pub fn with_pdf_renderer(mut self, list_type_id: i32, renderer: Arc<MockPdfRenderer>) -> Self {
        self.pdf_renderers = self.pdf_renderers.register(list_type_id, renderer);
        self
    }

    /// Register a user with the given email and subscribe them to `location_id`
    pub fn add_subscriber(&self, location_id: i32, email: Option<&str>) -> User {
        let user = test_user(email);
        self.users.insert(user.clone());
        self.subscriptions
            .insert(test_subscription(user.user_id, location_id));
        user
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps {
            publications: self.publications.clone(),
            locations: self.locations.clone(),
            subscriptions: self.subscriptions.clone(),
            users: self.users.clone(),
            notification_logs: self.notification_logs.clone(),
            email: self.email.clone(),
            pdf_renderers: self.pdf_renderers.clone(),
            audit_log: self.audit_log.clone(),
            notification_settings: self.notification_settings.clone(),
        }
    }
}
