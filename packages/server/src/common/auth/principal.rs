use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::AuthError;

/// Roles an authenticated user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Verified media/legal professional
    Verified,
    InternalAdminLocal,
    InternalAdminCtsc,
    SystemAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Verified => "VERIFIED",
            UserRole::InternalAdminLocal => "INTERNAL_ADMIN_LOCAL",
            UserRole::InternalAdminCtsc => "INTERNAL_ADMIN_CTSC",
            UserRole::SystemAdmin => "SYSTEM_ADMIN",
        }
    }

    /// Local and CTSC admins manage lists but may not read private list content
    pub fn is_internal_admin(&self) -> bool {
        matches!(self, UserRole::InternalAdminLocal | UserRole::InternalAdminCtsc)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VERIFIED" => Ok(UserRole::Verified),
            "INTERNAL_ADMIN_LOCAL" => Ok(UserRole::InternalAdminLocal),
            "INTERNAL_ADMIN_CTSC" => Ok(UserRole::InternalAdminCtsc),
            "SYSTEM_ADMIN" => Ok(UserRole::SystemAdmin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Identity system a user signed in through, or the system a publication came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    Sso,
    CftIdam,
    B2cIdam,
    CrimeIdam,
    ManualUpload,
    Other(String),
}

impl Provenance {
    pub fn as_str(&self) -> &str {
        match self {
            Provenance::Sso => "SSO",
            Provenance::CftIdam => "CFT_IDAM",
            Provenance::B2cIdam => "B2C_IDAM",
            Provenance::CrimeIdam => "CRIME_IDAM",
            Provenance::ManualUpload => "MANUAL_UPLOAD",
            Provenance::Other(value) => value,
        }
    }
}

impl From<String> for Provenance {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SSO" => Provenance::Sso,
            "CFT_IDAM" => Provenance::CftIdam,
            "B2C_IDAM" => Provenance::B2cIdam,
            "CRIME_IDAM" => Provenance::CrimeIdam,
            "MANUAL_UPLOAD" => Provenance::ManualUpload,
            _ => Provenance::Other(value),
        }
    }
}

impl From<&str> for Provenance {
    fn from(value: &str) -> Self {
        Provenance::from(value.to_string())
    }
}

impl From<Provenance> for String {
    fn from(value: Provenance) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user supplied by the sign-in layer.
///
/// `role` is `None` for signed-in users who hold no role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub provenance: Provenance,
}

impl Principal {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == Some(role)
    }

    pub fn is_system_admin(&self) -> bool {
        self.has_role(UserRole::SystemAdmin)
    }
}
