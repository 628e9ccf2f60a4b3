use chrono::{DateTime, Utc};
use chrono_tz::Europe::London;
use serde_json::{json, Value};

/// Path of the subscription management page, relative to the site root
pub const SUBSCRIPTION_PAGE_PATH: &str = "/subscription-management";

/// dd/mm/yyyy on the UK calendar, as shown in subscription emails
pub fn format_content_date(date: DateTime<Utc>) -> String {
    date.with_timezone(&London).format("%d/%m/%Y").to_string()
}

/// Template fields for a new-publication email.
///
/// `link_to_file` is only present when an attachment was prepared.
pub fn publication_personalisation(
    list_type_name: &str,
    publication_date: DateTime<Utc>,
    location_name: &str,
    base_url: &str,
    attachment: Option<&Value>,
) -> Value {
    let base_url = base_url.trim_end_matches('/');

    let mut personalisation = json!({
        "ListType": list_type_name,
        "content_date": format_content_date(publication_date),
        "locations": location_name,
        "start_page_link": base_url,
        "subscription_page_link": format!("{}{}", base_url, SUBSCRIPTION_PAGE_PATH),
    });

    if let Some(upload) = attachment {
        personalisation["link_to_file"] = upload.clone();
    }

    personalisation
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_content_date_format() {
        let date = Utc.with_ymd_and_hms(2026, 1, 5, 23, 30, 0).unwrap();
        assert_eq!(format_content_date(date), "05/01/2026");
    }

    #[test]
    fn test_content_date_uses_uk_calendar_in_summer() {
        // Local midnight during BST is 23:00 the previous day in UTC
        let date = Utc.with_ymd_and_hms(2026, 6, 14, 23, 0, 0).unwrap();
        assert_eq!(format_content_date(date), "15/06/2026");
    }

    #[test]
    fn test_personalisation_fields() {
        let date = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let value = publication_personalisation(
            "Crown Daily List",
            date,
            "Oxford Combined Court",
            "https://hearings.test/",
            None,
        );

        assert_eq!(value["ListType"], "Crown Daily List");
        assert_eq!(value["content_date"], "14/03/2026");
        assert_eq!(value["locations"], "Oxford Combined Court");
        assert_eq!(value["start_page_link"], "https://hearings.test");
        assert_eq!(
            value["subscription_page_link"],
            "https://hearings.test/subscription-management"
        );
        assert!(value.get("link_to_file").is_none());
    }
}
