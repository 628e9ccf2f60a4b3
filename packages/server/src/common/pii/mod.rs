//! Redaction of personal data from text that ends up in logs or the database.
//!
//! Provider error messages often echo the recipient address back, so every
//! error string recorded against a notification passes through here first.
//!
//! ```rust
//! use hearings_core::common::pii::redact_emails;
//!
//! let clean = redact_emails("Invalid recipient: jane@example.com");
//! assert_eq!(clean, "Invalid recipient: [REDACTED_EMAIL]");
//! ```
pub mod redactor;

pub use redactor::{contains_email, redact_emails, EMAIL_PLACEHOLDER};
