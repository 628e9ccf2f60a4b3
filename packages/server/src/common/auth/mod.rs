//! Principal types shared by the access gate, the audit trail and the JWT layer.
//!
//! The sign-in layer puts a `Principal` into request extensions; everything
//! downstream only reads it.
mod errors;
mod jwt;
mod principal;

pub use errors::AuthError;
pub use jwt::{Claims, JwtService};
pub use principal::{Principal, Provenance, UserRole};
