//! Audit trail for administrative mutations.
//!
//! Handlers finish with a [`Completion`]; the audit middleware passes it to an
//! [`AuditTrailRecorder`], which decides whether the request is worth an entry
//! and what to say about it. Handlers that know better declare an
//! [`AuditContext`] through the [`AuditHandle`] in request extensions.

pub mod classify;
pub mod context;
pub mod details;
pub mod models;
pub mod recorder;

pub use classify::{classify, classify_redirect, Classification, Completion};
pub use context::{AuditContext, AuditHandle, RequestSnapshot, SessionData};
pub use details::{build_details, derive_action, normalize_action};
pub use models::{AuditLogEntry, AuditOutcome, NewAuditLogEntry};
pub use recorder::{should_audit, AuditTrailRecorder, ResponseObserver, AUDIT_LOG_VIEW_PATH};
