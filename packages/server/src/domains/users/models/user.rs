use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subscriber account. Only the fields fan-out needs are loaded.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub user_provenance: String,
    pub role: Option<String>,
}

impl User {
    pub async fn find_by_id(user_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, Self>(
            "SELECT user_id, email, user_provenance, role FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Address to notify, ignoring blank values
    pub fn notification_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
