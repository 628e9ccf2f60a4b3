use lazy_static::lazy_static;
use regex::Regex;

/// Fixed token substituted for every email address
pub const EMAIL_PLACEHOLDER: &str = "[REDACTED_EMAIL]";

lazy_static! {
    // Email pattern - RFC 5322 simplified
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").unwrap();
}

/// Replace every email address in `text` with [`EMAIL_PLACEHOLDER`]
pub fn redact_emails(text: &str) -> String {
    EMAIL_REGEX.replace_all(text, EMAIL_PLACEHOLDER).into_owned()
}

pub fn contains_email(text: &str) -> bool {
    EMAIL_REGEX.is_match(text)
}
