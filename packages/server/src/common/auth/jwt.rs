use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{AuthError, Principal, Provenance};

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub provenance: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

impl Claims {
    /// An unrecognised role is dropped, leaving a signed-in user with no role
    pub fn to_principal(&self) -> Result<Principal, AuthError> {
        let user_id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)?;

        let role = match self.role.as_deref() {
            None | Some("") => None,
            Some(raw) => match raw.parse() {
                Ok(role) => Some(role),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Ignoring unrecognised role claim");
                    None
                }
            },
        };

        Ok(Principal {
            user_id,
            email: self.email.clone(),
            role,
            provenance: Provenance::from(self.provenance.as_str()),
        })
    }
}

/// JWT Service - creates and verifies JWT tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Token for `principal`, valid for 8 hours
    pub fn create_token(&self, principal: &Principal) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(8);

        let claims = Claims {
            sub: principal.user_id.to_string(),
            email: principal.email.clone(),
            role: principal.role.map(|role| role.as_str().to_string()),
            provenance: principal.provenance.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if token is valid and not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}
