use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::classify::{classify, Completion};
use super::context::{AuditHandle, RequestSnapshot, SessionData};
use super::details::{build_details, derive_action};
use super::models::NewAuditLogEntry;
use crate::common::{Principal, UserRole};
use crate::kernel::BaseAuditLogStore;

/// Route that lists audit entries. Requests to it are never audited.
pub const AUDIT_LOG_VIEW_PATH: &str = "/audit-log-view";

const AUDITED_METHODS: &[&str] = &["POST", "PUT", "PATCH", "DELETE"];

/// Told how a request finished. Only the first call per request counts.
#[async_trait]
pub trait ResponseObserver: Send + Sync {
    async fn on_complete(&self, completion: &Completion);
}

/// Whether a request gets an audit entry at all
pub fn should_audit(method: &str, principal: Option<&Principal>, path: &str) -> bool {
    let method = method.to_uppercase();
    if !AUDITED_METHODS.contains(&method.as_str()) {
        return false;
    }
    if !principal.is_some_and(|p| p.has_role(UserRole::SystemAdmin)) {
        return false;
    }
    let path = path.split('?').next().unwrap_or_default();
    path.trim_end_matches('/') != AUDIT_LOG_VIEW_PATH
}

/// Records at most one audit entry for a single request
pub struct AuditTrailRecorder {
    principal: Principal,
    request: RequestSnapshot,
    context: AuditHandle,
    writer: Arc<dyn BaseAuditLogStore>,
    completed: AtomicBool,
}

impl AuditTrailRecorder {
    pub fn new(
        principal: Principal,
        request: RequestSnapshot,
        writer: Arc<dyn BaseAuditLogStore>,
    ) -> Self {
        Self {
            principal,
            request,
            context: AuditHandle::new(),
            writer,
            completed: AtomicBool::new(false),
        }
    }

    /// Handle for the handler to declare its `AuditContext` through
    pub fn handle(&self) -> AuditHandle {
        self.context.clone()
    }

    /// Session as it stood when the response was produced
    pub fn with_session(mut self, session: SessionData) -> Self {
        self.request.session = session;
        self
    }

    fn compose(&self, completion: &Completion) -> Option<NewAuditLogEntry> {
        let context = self.context.snapshot();
        let classification = classify(completion, &self.request, &context);

        if !classification.should_log {
            debug!(
                path = %self.request.path,
                outcome = %classification.outcome,
                "Completion not audited"
            );
            return None;
        }

        let action = derive_action(&context, &self.request.method, &self.request.path);
        let details = build_details(&context, &self.request, &classification);

        Some(NewAuditLogEntry {
            user_id: self.principal.user_id,
            user_email: self.principal.email.clone(),
            user_role: self
                .principal
                .role
                .map(|role| role.as_str().to_string())
                .unwrap_or_default(),
            user_provenance: self.principal.provenance.to_string(),
            action,
            outcome: classification.outcome,
            details: Some(details),
        })
    }
}

#[async_trait]
impl ResponseObserver for AuditTrailRecorder {
    async fn on_complete(&self, completion: &Completion) {
        if self.completed.swap(true, Ordering::SeqCst) {
            debug!(path = %self.request.path, "Response already completed, ignoring");
            return;
        }

        let Some(entry) = self.compose(completion) else {
            return;
        };

        let action = entry.action.clone();
        let outcome = entry.outcome;
        match self.writer.append(entry).await {
            Ok(()) => info!(action = %action, outcome = %outcome, "Audit entry recorded"),
            Err(e) => error!(action = %action, error = %e, "Failed to write audit entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Provenance;
    use crate::domains::audit::{AuditContext, AuditOutcome};
    use crate::kernel::TestDependencies;
    use serde_json::json;
    use uuid::Uuid;

    fn admin() -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: Some("admin@justice.test".to_string()),
            role: Some(UserRole::SystemAdmin),
            provenance: Provenance::Sso,
        }
    }

    fn snapshot(method: &str, path: &str) -> RequestSnapshot {
        RequestSnapshot {
            method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_should_audit() {
        let admin = admin();
        let verified = Principal {
            role: Some(UserRole::Verified),
            ..admin.clone()
        };

        assert!(should_audit("POST", Some(&admin), "/delete-court"));
        assert!(should_audit("delete", Some(&admin), "/api/x"));
        assert!(!should_audit("GET", Some(&admin), "/delete-court"));
        assert!(!should_audit("POST", Some(&verified), "/delete-court"));
        assert!(!should_audit("POST", None, "/delete-court"));
        assert!(!should_audit("POST", Some(&admin), "/audit-log-view?page=2"));
    }

    #[tokio::test]
    async fn test_cancelled_redirect_recorded() {
        let deps = TestDependencies::new();
        let principal = admin();
        let recorder = AuditTrailRecorder::new(
            principal.clone(),
            snapshot("POST", "/delete-court"),
            deps.audit_log.clone(),
        );

        recorder
            .on_complete(&Completion::redirect("/system-admin-dashboard"))
            .await;

        let entries = deps.audit_log.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.action, "DELETE_COURT");
        assert_eq!(entry.outcome, AuditOutcome::Cancelled);
        assert_eq!(entry.user_id, principal.user_id);
        assert_eq!(entry.user_role, "SYSTEM_ADMIN");
        assert_eq!(entry.user_provenance, "SSO");
        assert_eq!(entry.details.as_deref(), Some("Status: Cancelled"));
    }

    #[tokio::test]
    async fn test_double_completion_records_once() {
        let deps = TestDependencies::new();
        let recorder = AuditTrailRecorder::new(
            admin(),
            snapshot("POST", "/api/admin/publications/1/reprocess"),
            deps.audit_log.clone(),
        );

        recorder.on_complete(&Completion::Json(json!({}))).await;
        recorder.on_complete(&Completion::Send("done".into())).await;

        assert_eq!(deps.audit_log.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_unlogged_first_completion_still_latches() {
        let deps = TestDependencies::new();
        let recorder = AuditTrailRecorder::new(
            admin(),
            snapshot("POST", "/add-court"),
            deps.audit_log.clone(),
        );

        recorder
            .on_complete(&Completion::redirect("/add-court-confirm"))
            .await;
        recorder.on_complete(&Completion::Json(json!({}))).await;

        assert!(deps.audit_log.entries().is_empty());
    }

    #[tokio::test]
    async fn test_render_errors_recorded() {
        let deps = TestDependencies::new();
        let recorder = AuditTrailRecorder::new(
            admin(),
            snapshot("POST", "/add-court"),
            deps.audit_log.clone(),
        );

        recorder
            .on_complete(&Completion::render(
                "add-court",
                json!({ "errors": [{ "text": "Enter a name", "href": "#name" }] }),
            ))
            .await;

        let entries = deps.audit_log.entries();
        assert_eq!(entries[0].outcome, AuditOutcome::ValidationError);
        assert_eq!(
            entries[0].details.as_deref(),
            Some("Status: Validation failed | Errors: Enter a name")
        );
    }

    #[tokio::test]
    async fn test_declared_context_used() {
        let deps = TestDependencies::new();
        let mut session = SessionData::default();
        session.insert("courtForm", json!({ "locationId": 9 }));
        let recorder = AuditTrailRecorder::new(
            admin(),
            snapshot("POST", "/api/admin/publications/1/reprocess"),
            deps.audit_log.clone(),
        )
        .with_session(session);

        recorder.handle().set(
            AuditContext::new()
                .action("reprocessPublication")
                .entity("Publication: 1"),
        );
        recorder.on_complete(&Completion::Json(json!({}))).await;

        let entry = &deps.audit_log.entries()[0];
        assert_eq!(entry.action, "REPROCESS_PUBLICATION");
        assert_eq!(
            entry.details.as_deref(),
            Some("Publication: 1 | locationId: 9 | Status: Completed successfully")
        );
    }

    #[tokio::test]
    async fn test_writer_failure_is_swallowed() {
        let deps = TestDependencies::new();
        deps.audit_log.fail_writes();
        let recorder = AuditTrailRecorder::new(
            admin(),
            snapshot("DELETE", "/api/x"),
            deps.audit_log.clone(),
        );

        recorder.on_complete(&Completion::Json(json!({}))).await;

        assert!(deps.audit_log.entries().is_empty());
    }
}
