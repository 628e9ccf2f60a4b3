use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A user's standing request to hear about new lists at a location
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub location_id: i32,
    pub date_added: DateTime<Utc>,
}

impl Subscription {
    pub async fn find_by_location(location_id: i32, pool: &PgPool) -> Result<Vec<Self>> {
        let subscriptions = sqlx::query_as::<_, Self>(
            "SELECT subscription_id, user_id, location_id, date_added
             FROM subscriptions
             WHERE location_id = $1
             ORDER BY date_added ASC",
        )
        .bind(location_id)
        .fetch_all(pool)
        .await?;
        Ok(subscriptions)
    }
}
