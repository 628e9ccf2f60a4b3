use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Classified result of an audited admin request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    ValidationError,
    Cancelled,
    Other,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::ValidationError => "validation_error",
            AuditOutcome::Cancelled => "cancelled",
            AuditOutcome::Other => "other",
        }
    }

    /// Phrase appended to the details column
    pub fn status_phrase(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "Status: Completed successfully",
            AuditOutcome::ValidationError => "Status: Validation failed",
            AuditOutcome::Cancelled => "Status: Cancelled",
            AuditOutcome::Other => "Status: Completed",
        }
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry handed to the audit writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditLogEntry {
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub user_role: String,
    pub user_provenance: String,
    pub action: String,
    pub outcome: AuditOutcome,
    pub details: Option<String>,
}

/// Append-only record of an administrative mutation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub user_role: String,
    pub user_provenance: String,
    pub action: String,
    pub outcome: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub async fn create(entry: &NewAuditLogEntry, pool: &PgPool) -> Result<Self> {
        let created = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO audit_logs (user_id, user_email, user_role, user_provenance, action, outcome, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.user_email.as_deref())
        .bind(&entry.user_role)
        .bind(&entry.user_provenance)
        .bind(&entry.action)
        .bind(entry.outcome.as_str())
        .bind(entry.details.as_deref())
        .fetch_one(pool)
        .await?;
        Ok(created)
    }

    pub async fn find_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let entries = sqlx::query_as::<_, Self>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(entries)
    }
}
