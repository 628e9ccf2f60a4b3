use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    pub iss: String,
    pub iat: i64,
}

#[derive(Debug, Serialize)]
pub struct EmailRequest {
    pub template_id: String,
    pub email_address: String,
    pub personalisation: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailResponse {
    pub id: String,
    pub reference: Option<String>,
    pub uri: Option<String>,
    pub content: Option<EmailContent>,
    pub template: Option<TemplateRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
    pub from_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRef {
    pub id: String,
    pub version: i64,
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.error, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
