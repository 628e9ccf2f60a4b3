use thiserror::Error;

/// Authentication and role errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("System admin access required")]
    SystemAdminRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Unknown user role: {0}")]
    UnknownRole(String),
}
