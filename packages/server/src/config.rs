use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub notify_api_key: String,
    pub notify_template_id: String,
    /// Template carrying a `link_to_file` placeholder, used when a PDF is attached
    pub notify_template_id_with_file: Option<String>,
    /// Public site root used for start page and subscription links in emails
    pub base_url: String,
    pub pdf_storage_dir: PathBuf,
    pub pdf_renderer_url: Option<String>,
    pub notification_concurrency: usize,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "court-hearings".to_string()),
            notify_api_key: env::var("NOTIFY_API_KEY").context("NOTIFY_API_KEY must be set")?,
            notify_template_id: env::var("NOTIFY_TEMPLATE_ID")
                .context("NOTIFY_TEMPLATE_ID must be set")?,
            notify_template_id_with_file: env::var("NOTIFY_TEMPLATE_ID_WITH_FILE").ok(),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            pdf_storage_dir: env::var("PDF_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("publication-pdfs")),
            pdf_renderer_url: env::var("PDF_RENDERER_URL").ok(),
            notification_concurrency: env::var("NOTIFICATION_CONCURRENCY")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("NOTIFICATION_CONCURRENCY must be a valid number")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}
