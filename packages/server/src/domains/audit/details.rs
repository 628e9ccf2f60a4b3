use serde_json::Value;
use std::collections::HashSet;

use super::classify::Classification;
use super::context::{AuditContext, RequestSnapshot};
use super::models::AuditOutcome;

/// Body fields copied into the details when the handler declared nothing
const BODY_FIELDS: &[&str] = &[
    "name",
    "welshName",
    "title",
    "id",
    "locationId",
    "courtId",
    "artefactId",
    "publicationId",
    "userId",
    "subscriptionId",
    "listTypeId",
    "email",
];

/// Fields read from objects stored in the session (in-progress forms)
const SESSION_FIELDS: &[&str] = &["name", "id", "locationId", "fileName"];

const SEPARATOR: &str = " | ";

/// Audit action for the request.
///
/// `deleteCourt`, `delete-court` and `DELETE_COURT` all become `DELETE_COURT`.
/// Without a declared action the path is used, prefixed by the method
/// unless it is a POST.
pub fn derive_action(context: &AuditContext, method: &str, path: &str) -> String {
    if let Some(action) = context.action.as_deref().map(normalize_action) {
        if !action.is_empty() {
            return action;
        }
    }

    let from_path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_matches('/')
        .replace(['/', '-'], "_")
        .to_uppercase();
    let from_path = if from_path.is_empty() {
        "ROOT".to_string()
    } else {
        from_path
    };

    let method = method.to_uppercase();
    if method == "POST" {
        from_path
    } else {
        format!("{}_{}", method, from_path)
    }
}

pub fn normalize_action(action: &str) -> String {
    let mut out = String::with_capacity(action.len() + 4);
    let mut prev: Option<char> = None;

    for c in action.trim().chars() {
        if c.is_alphanumeric() {
            let starts_word =
                c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            if starts_word && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_uppercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }

    out.trim_end_matches('_').to_string()
}

/// Human readable details column.
///
/// Declared information comes first, then whatever can be recognised in the
/// request. A label already used is not repeated, however it was spelt.
pub fn build_details(
    context: &AuditContext,
    request: &RequestSnapshot,
    classification: &Classification,
) -> String {
    let mut details = Details::default();

    if let Some(entity) = context.entity_info.as_deref() {
        details.push_raw(entity);
    }
    for (label, value) in &context.fields {
        details.push(label, value);
    }

    for field in BODY_FIELDS {
        if let Some(value) = request.body.get(*field).and_then(scalar_text) {
            details.push(field, &value);
        }
    }

    for (name, value) in &request.route_params {
        details.push(name, value);
    }

    for nested in request.session.0.values() {
        let Value::Object(object) = nested else {
            continue;
        };
        for field in SESSION_FIELDS {
            if let Some(value) = object.get(*field).and_then(scalar_text) {
                details.push(field, &value);
            }
        }
    }

    details.push_raw(classification.outcome.status_phrase());

    if classification.outcome == AuditOutcome::ValidationError && !classification.errors.is_empty()
    {
        details.push_raw(&format!("Errors: {}", classification.errors.join(", ")));
    }

    details.parts.join(SEPARATOR)
}

#[derive(Default)]
struct Details {
    parts: Vec<String>,
    seen: HashSet<String>,
}

impl Details {
    fn push(&mut self, label: &str, value: &str) {
        if value.trim().is_empty() || !self.seen.insert(normalize_key(label)) {
            return;
        }
        self.parts.push(format!("{}: {}", label, value));
    }

    fn push_raw(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.parts.push(text.to_string());
        }
    }
}

/// `locationId`, `location_id` and `Location-ID` compare equal
fn normalize_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
