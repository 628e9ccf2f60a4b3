use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// State of one notification attempt. Only `Pending` may transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationStatus::Pending)
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid notification status: {}", s)),
        }
    }
}

impl TryFrom<String> for NotificationStatus {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Fields needed to open a notification log row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotificationLog {
    pub publication_id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
}

impl NewNotificationLog {
    pub fn pending(publication_id: Uuid, subscription_id: Uuid, user_id: Uuid) -> Self {
        Self {
            publication_id,
            subscription_id,
            user_id,
            status: NotificationStatus::Pending,
            error_message: None,
        }
    }

    /// A row that never reached the provider (e.g. the user has no email)
    pub fn failed(
        publication_id: Uuid,
        subscription_id: Uuid,
        user_id: Uuid,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            publication_id,
            subscription_id,
            user_id,
            status: NotificationStatus::Failed,
            error_message: Some(reason.into()),
        }
    }
}

/// One notification attempt for a (publication, subscription) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationLog {
    pub notification_id: Uuid,
    pub publication_id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: NotificationStatus,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl NotificationLog {
    pub async fn create(new: &NewNotificationLog, pool: &PgPool) -> Result<Self> {
        let log = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO notification_logs (publication_id, subscription_id, user_id, status, error_message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.publication_id)
        .bind(new.subscription_id)
        .bind(new.user_id)
        .bind(new.status.as_str())
        .bind(new.error_message.as_deref())
        .fetch_one(pool)
        .await?;
        Ok(log)
    }

    /// Pending -> Sent. A row already in a terminal state is left untouched.
    pub async fn mark_sent(
        notification_id: Uuid,
        provider_message_id: &str,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notification_logs
             SET status = 'sent', provider_message_id = $2, sent_at = NOW()
             WHERE notification_id = $1 AND status = 'pending'",
        )
        .bind(notification_id)
        .bind(provider_message_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Pending -> Failed. A row already in a terminal state is left untouched.
    pub async fn mark_failed(
        notification_id: Uuid,
        error_message: &str,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notification_logs
             SET status = 'failed', error_message = $2
             WHERE notification_id = $1 AND status = 'pending'",
        )
        .bind(notification_id)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn find_by_publication(publication_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let logs = sqlx::query_as::<_, Self>(
            "SELECT * FROM notification_logs WHERE publication_id = $1 ORDER BY created_at ASC",
        )
        .bind(publication_id)
        .fetch_all(pool)
        .await?;
        Ok(logs)
    }
}
