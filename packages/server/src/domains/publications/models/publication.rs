use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::Provenance;

/// Visibility tier of a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sensitivity {
    Public,
    Private,
    Classified,
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensitivity::Public => write!(f, "PUBLIC"),
            Sensitivity::Private => write!(f, "PRIVATE"),
            Sensitivity::Classified => write!(f, "CLASSIFIED"),
        }
    }
}

impl std::str::FromStr for Sensitivity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PUBLIC" => Ok(Sensitivity::Public),
            "PRIVATE" => Ok(Sensitivity::Private),
            "CLASSIFIED" => Ok(Sensitivity::Classified),
            _ => Err(anyhow::anyhow!("Invalid sensitivity: {}", s)),
        }
    }
}

impl TryFrom<String> for Sensitivity {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A published hearing list (artefact). Content lives in `payload`, which is
/// only loaded by content views.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub artefact_id: Uuid,
    pub location_id: String,
    pub list_type_id: i32,
    pub content_date: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub sensitivity: Sensitivity,
    pub language: String,
    pub display_from: DateTime<Utc>,
    pub display_to: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub provenance: Provenance,
    pub is_flat_file: bool,
    pub last_received_date: DateTime<Utc>,
}

const PUBLICATION_COLUMNS: &str = "artefact_id, location_id, list_type_id, content_date, \
     sensitivity, language, display_from, display_to, provenance, is_flat_file, last_received_date";

impl Publication {
    pub async fn find_by_id(artefact_id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let publication = sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM artefacts WHERE artefact_id = $1",
            PUBLICATION_COLUMNS
        ))
        .bind(artefact_id)
        .fetch_optional(pool)
        .await?;
        Ok(publication)
    }

    /// Load the JSON content of a publication. `None` for flat files and
    /// unknown ids.
    pub async fn find_payload(
        artefact_id: Uuid,
        pool: &PgPool,
    ) -> Result<Option<serde_json::Value>> {
        let payload = sqlx::query_scalar::<_, Option<serde_json::Value>>(
            "SELECT payload FROM artefacts WHERE artefact_id = $1",
        )
        .bind(artefact_id)
        .fetch_optional(pool)
        .await?;
        Ok(payload.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitivity_parses_stored_values() {
        assert_eq!("PUBLIC".parse::<Sensitivity>().unwrap(), Sensitivity::Public);
        assert_eq!(
            Sensitivity::try_from("CLASSIFIED".to_string()).unwrap(),
            Sensitivity::Classified
        );
        assert!("SECRET".parse::<Sensitivity>().is_err());
    }

    #[test]
    fn test_sensitivity_serializes_upper_case() {
        let json = serde_json::to_string(&Sensitivity::Private).unwrap();
        assert_eq!(json, "\"PRIVATE\"");
    }
}
