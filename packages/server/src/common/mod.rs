// Common types and utilities shared across the application

pub mod auth;
pub mod locale;
pub mod pii;

pub use auth::{AuthError, Claims, JwtService, Principal, Provenance, UserRole};
pub use locale::{Bilingual, Locale};
