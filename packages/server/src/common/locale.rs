use serde::{Deserialize, Serialize};

/// Language a page or message is shown in. Welsh is selected with `?lng=cy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "cy")]
    Welsh,
}

impl Locale {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()) {
            Some(c) if c == "cy" || c.starts_with("cy-") => Locale::Welsh,
            _ => Locale::English,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Welsh => "cy",
        }
    }
}

/// Text held in both languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bilingual {
    pub en: &'static str,
    pub cy: &'static str,
}

impl Bilingual {
    pub const fn new(en: &'static str, cy: &'static str) -> Self {
        Self { en, cy }
    }

    pub fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => self.en,
            Locale::Welsh => self.cy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Locale::from_code(Some("cy")), Locale::Welsh);
        assert_eq!(Locale::from_code(Some("CY-GB")), Locale::Welsh);
        assert_eq!(Locale::from_code(Some("en")), Locale::English);
        assert_eq!(Locale::from_code(None), Locale::English);
    }
}
