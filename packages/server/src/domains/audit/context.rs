use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

use super::models::AuditOutcome;

/// What a handler declares about the mutation it performed.
///
/// Anything set here takes priority over what the recorder would otherwise
/// infer from the request body, route params, session or redirect target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
    pub action: Option<String>,
    pub entity_info: Option<String>,
    pub fields: Vec<(String, String)>,
    pub outcome: Option<AuditOutcome>,
    pub force_log: bool,
}

impl AuditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn entity(mut self, entity_info: impl Into<String>) -> Self {
        self.entity_info = Some(entity_info.into());
        self
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((label.into(), value.into()));
        self
    }

    /// Declaring an outcome also forces the entry to be written
    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = Some(outcome);
        self.force_log = true;
        self
    }

    pub fn force_log(mut self) -> Self {
        self.force_log = true;
        self
    }

    pub fn is_explicit(&self) -> bool {
        self.force_log || self.outcome.is_some() || self.action.is_some()
    }
}

/// Shared slot a handler writes its `AuditContext` into.
///
/// The audit middleware keeps one clone and hands the other to the handler
/// through request extensions.
#[derive(Debug, Clone, Default)]
pub struct AuditHandle(Arc<Mutex<AuditContext>>);

impl AuditHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, context: AuditContext) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = context;
        }
    }

    pub fn update(&self, f: impl FnOnce(AuditContext) -> AuditContext) {
        if let Ok(mut slot) = self.0.lock() {
            let current = std::mem::take(&mut *slot);
            *slot = f(current);
        }
    }

    pub fn snapshot(&self) -> AuditContext {
        self.0.lock().map(|slot| slot.clone()).unwrap_or_default()
    }
}

/// Session values visible to the request (flash errors, in-progress forms)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData(pub Map<String, Value>);

impl SessionData {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// First non-empty array stored under a key ending in `Errors`/`errors`
    pub fn validation_errors(&self) -> Option<&Vec<Value>> {
        self.0.iter().find_map(|(key, value)| {
            if !key.ends_with("Errors") && !key.ends_with("errors") {
                return None;
            }
            match value {
                Value::Array(errors) if !errors.is_empty() => Some(errors),
                _ => None,
            }
        })
    }
}

/// The parts of a mutating request the recorder needs after the handler ran
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
    pub method: String,
    pub path: String,
    pub body: Map<String, Value>,
    pub route_params: Vec<(String, String)>,
    pub session: SessionData,
}
