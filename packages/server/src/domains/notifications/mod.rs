pub mod dispatcher;
pub mod models;
pub mod personalisation;

pub use dispatcher::{
    send_publication_notifications, NotificationResult, NotificationSettings,
    PublicationNotificationRequest, RecipientError, RecipientOutcome, NO_EMAIL_REASON,
};
