pub mod notification_log;

pub use notification_log::{NewNotificationLog, NotificationLog, NotificationStatus};
