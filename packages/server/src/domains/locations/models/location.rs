use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Court or tribunal venue that publications and subscriptions hang off
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub location_id: i32,
    pub name: String,
    pub welsh_name: Option<String>,
}

impl Location {
    pub async fn find_by_id(location_id: i32, pool: &PgPool) -> Result<Option<Self>> {
        let location = sqlx::query_as::<_, Self>(
            "SELECT location_id, name, welsh_name FROM locations WHERE location_id = $1",
        )
        .bind(location_id)
        .fetch_optional(pool)
        .await?;
        Ok(location)
    }

    /// Name to show for a locale, falling back to English when no Welsh name exists
    pub fn display_name(&self, locale: &str) -> &str {
        match (locale, &self.welsh_name) {
            ("cy", Some(welsh)) if !welsh.is_empty() => welsh,
            _ => &self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_welsh_for_cy() {
        let location = Location {
            location_id: 1,
            name: "Cardiff Crown Court".to_string(),
            welsh_name: Some("Llys y Goron Caerdydd".to_string()),
        };
        assert_eq!(location.display_name("cy"), "Llys y Goron Caerdydd");
        assert_eq!(location.display_name("en"), "Cardiff Crown Court");
    }

    #[test]
    fn test_display_name_falls_back_to_english() {
        let location = Location {
            location_id: 2,
            name: "Oxford Combined Court".to_string(),
            welsh_name: None,
        };
        assert_eq!(location.display_name("cy"), "Oxford Combined Court");
    }
}
