// Client for the GOV.UK Notify transactional email API.
// https://docs.notifications.service.gov.uk/rest-api.html

pub mod models;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{header, Client};
use serde_json::Value;
use thiserror::Error;

use crate::models::{EmailRequest, EmailResponse, ErrorResponse, TokenClaims};

pub const DEFAULT_BASE_URL: &str = "https://api.notifications.service.gov.uk";

/// Notify refuses attachments larger than 2MB.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Service id and secret are both UUIDs appended to the key name.
const UUID_LEN: usize = 36;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid Notify API key")]
    InvalidApiKey,

    #[error("Failed to sign Notify token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Request to Notify failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notify returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("File is {0} bytes, larger than the 2MB Notify limit")]
    FileTooLarge(usize),
}

#[derive(Debug, Clone)]
pub struct NotifyOptions {
    pub api_key: String,
    pub base_url: String,
}

impl NotifyOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotifyService {
    base_url: String,
    service_id: String,
    secret_key: String,
    client: Client,
}

impl NotifyService {
    /// Build a client from a combined API key (`{key_name}-{service_id}-{secret_key}`).
    pub fn new(options: NotifyOptions) -> Result<Self, NotifyError> {
        let (service_id, secret_key) = split_api_key(&options.api_key)?;

        Ok(Self {
            base_url: options.base_url.trim_end_matches('/').to_string(),
            service_id,
            secret_key,
            client: Client::new(),
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Send an email using a template. Returns the Notify notification.
    pub async fn send_email(
        &self,
        template_id: &str,
        email_address: &str,
        personalisation: Value,
        reference: Option<&str>,
    ) -> Result<EmailResponse, NotifyError> {
        let url = format!("{}/v2/notifications/email", self.base_url);

        let body = EmailRequest {
            template_id: template_id.to_string(),
            email_address: email_address.to_string(),
            personalisation,
            reference: reference.map(str::to_string),
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth_token()?)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&raw)
                .map(|parsed| parsed.summary())
                .unwrap_or(raw);
            tracing::warn!(status = status.as_u16(), "Notify rejected email request");
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<EmailResponse>().await?)
    }

    /// Short-lived token Notify expects on every request, signed with the secret key.
    fn auth_token(&self) -> Result<String, NotifyError> {
        let claims = TokenClaims {
            iss: self.service_id.clone(),
            iat: chrono::Utc::now().timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )?)
    }
}

/// Encode a file so it can be sent as a `link_to_file` personalisation value.
pub fn prepare_upload(
    contents: &[u8],
    filename: Option<&str>,
    confirm_email_before_download: bool,
) -> Result<Value, NotifyError> {
    if contents.len() > MAX_UPLOAD_BYTES {
        return Err(NotifyError::FileTooLarge(contents.len()));
    }

    let mut upload = serde_json::json!({
        "file": STANDARD.encode(contents),
        "confirm_email_before_download": confirm_email_before_download,
    });
    if let Some(name) = filename {
        upload["filename"] = Value::String(name.to_string());
    }

    Ok(upload)
}

fn split_api_key(api_key: &str) -> Result<(String, String), NotifyError> {
    let key = api_key.trim();
    // key_name, separator, service_id, separator, secret
    if !key.is_ascii() || key.len() < UUID_LEN * 2 + 2 {
        return Err(NotifyError::InvalidApiKey);
    }

    let secret_key = &key[key.len() - UUID_LEN..];
    let service_start = key.len() - (UUID_LEN * 2 + 1);
    let service_id = &key[service_start..service_start + UUID_LEN];

    if key.as_bytes()[service_start + UUID_LEN] != b'-' {
        return Err(NotifyError::InvalidApiKey);
    }

    Ok((service_id.to_string(), secret_key.to_string()))
}
