use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::models::NewNotificationLog;
use super::personalisation::publication_personalisation;
use crate::common::pii::redact_emails;
use crate::domains::publications::processor::MAX_PDF_SIZE_BYTES;
use crate::domains::subscriptions::Subscription;
use crate::kernel::ServerDeps;

/// Reason recorded when a subscriber has no address to send to
pub const NO_EMAIL_REASON: &str = "No email address found for user";

/// Reported for a recipient whose send panicked
pub const RECIPIENT_PANIC_REASON: &str = "Notification attempt aborted unexpectedly";

/// Email settings shared by every fan-out
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub template_id: String,
    /// Used instead of `template_id` when a PDF is attached
    pub template_id_with_file: Option<String>,
    pub base_url: String,
    /// Maximum recipients in flight at once
    pub concurrency: usize,
}

/// A newly processed publication to tell subscribers about
#[derive(Debug, Clone)]
pub struct PublicationNotificationRequest {
    pub publication_id: Uuid,
    pub location_id: i32,
    pub location_name: String,
    pub list_type_name: String,
    pub publication_date: DateTime<Utc>,
    pub pdf_file_path: Option<PathBuf>,
}

/// What happened to one subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientOutcome {
    Sent { user_id: Uuid, message_id: String },
    Failed { user_id: Uuid, error: String },
    Skipped { user_id: Uuid, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientError {
    /// `None` when the whole batch could not start
    pub user_id: Option<Uuid>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResult {
    /// False only when the batch could not start (bad location, subscription lookup)
    pub success: bool,
    pub total_subscribers: usize,
    pub sent_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<RecipientError>,
}

impl NotificationResult {
    pub fn empty() -> Self {
        Self {
            success: true,
            total_subscribers: 0,
            sent_count: 0,
            failed_count: 0,
            skipped_count: 0,
            errors: Vec::new(),
        }
    }

    pub fn precondition_failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![RecipientError {
                user_id: None,
                error: error.into(),
            }],
            ..Self::empty()
        }
    }

    pub fn from_outcomes(outcomes: Vec<RecipientOutcome>) -> Self {
        let mut result = Self {
            total_subscribers: outcomes.len(),
            ..Self::empty()
        };

        for outcome in outcomes {
            match outcome {
                RecipientOutcome::Sent { .. } => result.sent_count += 1,
                RecipientOutcome::Failed { user_id, error } => {
                    result.failed_count += 1;
                    result.errors.push(RecipientError {
                        user_id: Some(user_id),
                        error,
                    });
                }
                RecipientOutcome::Skipped { user_id, reason } => {
                    result.skipped_count += 1;
                    result.errors.push(RecipientError {
                        user_id: Some(user_id),
                        error: reason,
                    });
                }
            }
        }

        result
    }
}

/// Email every subscriber of the publication's location.
///
/// Each subscriber is handled on its own: a lookup or provider failure for one
/// recipient is recorded against that recipient and never stops the others.
#[instrument(
    skip(request, deps),
    fields(publication_id = %request.publication_id, location_id = request.location_id)
)]
pub async fn send_publication_notifications(
    request: &PublicationNotificationRequest,
    deps: &ServerDeps,
) -> NotificationResult {
    let subscriptions = match deps.subscriptions.find_by_location(request.location_id).await {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            error!(error = %e, "Failed to load subscriptions");
            return NotificationResult::precondition_failed(format!(
                "Failed to load subscriptions: {}",
                e
            ));
        }
    };

    if subscriptions.is_empty() {
        info!("No subscribers for location");
        return NotificationResult::empty();
    }

    let settings = &deps.notification_settings;
    let attachment = match (&request.pdf_file_path, &settings.template_id_with_file) {
        (Some(path), Some(_)) => load_attachment(path).await,
        _ => None,
    };
    let template_id = match (&attachment, &settings.template_id_with_file) {
        (Some(_), Some(with_file)) => with_file.as_str(),
        _ => settings.template_id.as_str(),
    };

    let personalisation = publication_personalisation(
        &request.list_type_name,
        request.publication_date,
        &request.location_name,
        &settings.base_url,
        attachment.as_ref(),
    );

    debug!(
        subscribers = subscriptions.len(),
        template_id,
        with_attachment = attachment.is_some(),
        "Sending publication notifications"
    );

    let publication_id = request.publication_id;
    let personalisation = &personalisation;
    let outcomes: Vec<RecipientOutcome> = stream::iter(subscriptions)
        .map(move |subscription| async move {
            let user_id = subscription.user_id;
            AssertUnwindSafe(notify_subscriber(
                &subscription,
                publication_id,
                template_id,
                personalisation,
                deps,
            ))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(user_id = %user_id, "Notification task panicked");
                RecipientOutcome::Failed {
                    user_id,
                    error: RECIPIENT_PANIC_REASON.to_string(),
                }
            })
        })
        .buffer_unordered(settings.concurrency.max(1))
        .collect()
        .await;

    let result = NotificationResult::from_outcomes(outcomes);

    info!(
        total = result.total_subscribers,
        sent = result.sent_count,
        failed = result.failed_count,
        skipped = result.skipped_count,
        "Publication notifications complete"
    );

    result
}

async fn notify_subscriber(
    subscription: &Subscription,
    publication_id: Uuid,
    template_id: &str,
    personalisation: &Value,
    deps: &ServerDeps,
) -> RecipientOutcome {
    let user_id = subscription.user_id;

    let email = match deps.users.find_by_id(user_id).await {
        Ok(user) => user
            .as_ref()
            .and_then(|u| u.notification_email())
            .map(str::to_string),
        Err(e) => {
            let error = redact_emails(&format!("User lookup failed: {}", e));
            warn!(user_id = %user_id, error = %error, "Could not resolve subscriber");
            record_failure(subscription, publication_id, &error, deps).await;
            return RecipientOutcome::Failed { user_id, error };
        }
    };

    let Some(email) = email else {
        record_failure(subscription, publication_id, NO_EMAIL_REASON, deps).await;
        debug!(user_id = %user_id, "Subscriber has no email, skipping");
        return RecipientOutcome::Skipped {
            user_id,
            reason: NO_EMAIL_REASON.to_string(),
        };
    };

    // The pending row must exist before the provider is called
    let pending = NewNotificationLog::pending(publication_id, subscription.subscription_id, user_id);
    let notification_id = match deps.notification_logs.create(pending).await {
        Ok(id) => id,
        Err(e) => {
            let error = redact_emails(&format!("Failed to record notification: {}", e));
            error!(user_id = %user_id, error = %error, "Notification not sent");
            record_failure(subscription, publication_id, &error, deps).await;
            return RecipientOutcome::Failed { user_id, error };
        }
    };

    match deps
        .email
        .send_email(template_id, &email, personalisation.clone())
        .await
    {
        Ok(message_id) => {
            if let Err(e) = deps
                .notification_logs
                .mark_sent(notification_id, &message_id)
                .await
            {
                warn!(notification_id = %notification_id, error = %e, "Sent notification left pending");
            }
            RecipientOutcome::Sent {
                user_id,
                message_id,
            }
        }
        Err(e) => {
            let error = redact_emails(&e.to_string());
            warn!(user_id = %user_id, error = %error, "Notification send failed");
            if let Err(log_err) = deps
                .notification_logs
                .mark_failed(notification_id, &error)
                .await
            {
                warn!(
                    notification_id = %notification_id,
                    error = %redact_emails(&log_err.to_string()),
                    "Failed notification left pending"
                );
            }
            RecipientOutcome::Failed { user_id, error }
        }
    }
}

/// Write a row straight into Failed for an attempt that never reached the provider
async fn record_failure(
    subscription: &Subscription,
    publication_id: Uuid,
    error: &str,
    deps: &ServerDeps,
) {
    let log = NewNotificationLog::failed(
        publication_id,
        subscription.subscription_id,
        subscription.user_id,
        error,
    );
    if let Err(e) = deps.notification_logs.create(log).await {
        warn!(
            user_id = %subscription.user_id,
            error = %redact_emails(&e.to_string()),
            "Failed to record unsent notification"
        );
    }
}

/// Encode the PDF for the with-file template. Missing or oversized files send without it.
async fn load_attachment(path: &Path) -> Option<Value> {
    let size = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "PDF not readable, sending without attachment");
            return None;
        }
    };

    if size > MAX_PDF_SIZE_BYTES {
        info!(path = %path.display(), size, "PDF too large to attach");
        return None;
    }

    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "PDF not readable, sending without attachment");
            return None;
        }
    };

    let filename = path.file_name().and_then(|name| name.to_str());
    match gov_notify::prepare_upload(&contents, filename, false) {
        Ok(upload) => Some(upload),
        Err(e) => {
            warn!(error = %e, "Could not prepare PDF attachment");
            None
        }
    }
}
