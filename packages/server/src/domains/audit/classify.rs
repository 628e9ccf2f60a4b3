use serde_json::Value;

use super::context::{AuditContext, RequestSnapshot};
use super::models::AuditOutcome;

/// How a handler finished its response
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Redirect { location: String },
    Render { view: String, model: Value },
    Json(Value),
    Send(String),
}

impl Completion {
    pub fn redirect(location: impl Into<String>) -> Self {
        Completion::Redirect {
            location: location.into(),
        }
    }

    pub fn render(view: impl Into<String>, model: Value) -> Self {
        Completion::Render {
            view: view.into(),
            model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: AuditOutcome,
    pub should_log: bool,
    /// Validation messages to append to the details
    pub errors: Vec<String>,
}

/// Redirect targets that are steps inside a multi-page flow
const FLOW_STEP_MARKERS: &[&str] = &["-confirm", "-summary", "-check"];

pub fn classify(
    completion: &Completion,
    request: &RequestSnapshot,
    context: &AuditContext,
) -> Classification {
    let inferred = infer(completion, request);

    match context.outcome {
        Some(outcome) => Classification {
            outcome,
            should_log: true,
            errors: if outcome == AuditOutcome::ValidationError {
                inferred.errors
            } else {
                Vec::new()
            },
        },
        None => Classification {
            should_log: inferred.should_log || context.force_log,
            ..inferred
        },
    }
}

fn infer(completion: &Completion, request: &RequestSnapshot) -> Classification {
    match completion {
        Completion::Render { model, .. } => {
            let errors = model.get("errors").map(error_texts).unwrap_or_default();
            let has_errors = model.get("errors").is_some_and(is_non_empty);
            if has_errors {
                Classification {
                    outcome: AuditOutcome::ValidationError,
                    should_log: true,
                    errors,
                }
            } else {
                not_logged(AuditOutcome::Other)
            }
        }
        Completion::Redirect { location } => {
            if let Some(errors) = request.session.validation_errors() {
                return Classification {
                    outcome: AuditOutcome::ValidationError,
                    should_log: true,
                    errors: errors.iter().flat_map(error_texts).collect(),
                };
            }

            match classify_redirect(location, &request.path) {
                AuditOutcome::Cancelled => Classification {
                    outcome: AuditOutcome::Cancelled,
                    should_log: true,
                    errors: Vec::new(),
                },
                outcome => not_logged(outcome),
            }
        }
        Completion::Json(_) | Completion::Send(_) => Classification {
            outcome: AuditOutcome::Success,
            should_log: true,
            errors: Vec::new(),
        },
    }
}

fn not_logged(outcome: AuditOutcome) -> Classification {
    Classification {
        outcome,
        should_log: false,
        errors: Vec::new(),
    }
}

/// Guess the outcome of a redirect from its target.
///
/// A redirect back to the page that was posted is read as a cancel, which also
/// catches handlers that redirect to the same path after succeeding.
pub fn classify_redirect(location: &str, current_path: &str) -> AuditOutcome {
    let target = strip_query(location);

    if FLOW_STEP_MARKERS.iter().any(|marker| target.contains(marker)) {
        return AuditOutcome::Other;
    }
    if target.contains("dashboard") {
        return AuditOutcome::Cancelled;
    }
    if target == strip_query(current_path) {
        return AuditOutcome::Cancelled;
    }
    AuditOutcome::Other
}

/// Path part of a relative or absolute URL
fn strip_query(location: &str) -> String {
    if let Ok(url) = url::Url::parse(location) {
        return url.path().to_string();
    }
    location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

/// Message texts out of the shapes error summaries come in:
/// plain strings, `{text}`/`{message}` objects, or lists/maps of either.
pub fn error_texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) if !text.is_empty() => vec![text.clone()],
        Value::Array(items) => items.iter().flat_map(error_texts).collect(),
        Value::Object(map) => {
            for key in ["text", "message"] {
                if let Some(Value::String(text)) = map.get(key) {
                    return vec![text.clone()];
                }
            }
            map.values().flat_map(error_texts).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(path: &str) -> RequestSnapshot {
        RequestSnapshot {
            method: "POST".to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_redirect_targets() {
        let cases = [
            ("/delete-court-confirm", AuditOutcome::Other),
            ("/upload-summary?id=1", AuditOutcome::Other),
            ("/system-admin-dashboard", AuditOutcome::Cancelled),
            ("/delete-court?lng=cy", AuditOutcome::Cancelled),
            ("https://portal.test/delete-court", AuditOutcome::Cancelled),
            ("/delete-court-success", AuditOutcome::Other),
        ];
        for (target, expected) in cases {
            assert_eq!(
                classify_redirect(target, "/delete-court"),
                expected,
                "{}",
                target
            );
        }
    }

    #[test]
    fn test_plain_render_not_logged() {
        let completion = Completion::render("add-court", json!({ "errors": [] }));
        let result = classify(&completion, &request("/add-court"), &AuditContext::new());
        assert!(!result.should_log);
    }

    #[test]
    fn test_render_with_errors() {
        let completion = Completion::render(
            "add-court",
            json!({ "errors": [{ "text": "Enter a name", "href": "#name" }] }),
        );
        let result = classify(&completion, &request("/add-court"), &AuditContext::new());
        assert_eq!(result.outcome, AuditOutcome::ValidationError);
        assert!(result.should_log);
        assert_eq!(result.errors, vec!["Enter a name".to_string()]);
    }

    #[test]
    fn test_session_errors_win_over_target() {
        let mut req = request("/add-court");
        req.session
            .insert("addCourtErrors", json!(["Enter a Welsh name"]));

        let result = classify(
            &Completion::redirect("/system-admin-dashboard"),
            &req,
            &AuditContext::new(),
        );
        assert_eq!(result.outcome, AuditOutcome::ValidationError);
        assert_eq!(result.errors, vec!["Enter a Welsh name".to_string()]);
    }

    #[test]
    fn test_other_redirect_needs_flag() {
        let completion = Completion::redirect("/add-court-success");
        let req = request("/add-court");

        assert!(!classify(&completion, &req, &AuditContext::new()).should_log);

        let forced = classify(&completion, &req, &AuditContext::new().force_log());
        assert!(forced.should_log);
        assert_eq!(forced.outcome, AuditOutcome::Other);
    }

    #[test]
    fn test_declared_outcome_wins() {
        let result = classify(
            &Completion::redirect("/add-court"),
            &request("/add-court"),
            &AuditContext::new().outcome(AuditOutcome::Success),
        );
        assert_eq!(result.outcome, AuditOutcome::Success);
        assert!(result.should_log);
    }

    #[test]
    fn test_json_and_send_always_success() {
        for completion in [Completion::Json(json!({})), Completion::Send("ok".into())] {
            let result = classify(&completion, &request("/api/x"), &AuditContext::new());
            assert_eq!(result.outcome, AuditOutcome::Success);
            assert!(result.should_log);
        }
    }
}
