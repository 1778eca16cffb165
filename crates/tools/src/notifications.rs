//! Reminder notifications derived from the subject's settings.

use uuid::Uuid;

use debie_core::error::Result;
use debie_core::insight::{Notification, NotificationPriority};
use debie_core::profile::UserSettings;

use crate::cache::ContextCache;
use crate::fetch::DataFetcher;

struct Reminder {
    notification_type: &'static str,
    title: &'static str,
    message: &'static str,
    priority: NotificationPriority,
    enabled: fn(&UserSettings) -> bool,
}

const REMINDERS: &[Reminder] = &[
    Reminder {
        notification_type: "food_log_reminder",
        title: "Time to log your meal",
        message: "Don't forget to log what you've eaten today",
        priority: NotificationPriority::Medium,
        enabled: food_enabled,
    },
    Reminder {
        notification_type: "medication_reminder",
        title: "Medication reminder",
        message: "Time to take your medication",
        priority: NotificationPriority::High,
        enabled: medication_enabled,
    },
    Reminder {
        notification_type: "insulin_reminder",
        title: "Insulin reminder",
        message: "Remember to log your insulin dose",
        priority: NotificationPriority::High,
        enabled: insulin_enabled,
    },
];

fn food_enabled(s: &UserSettings) -> bool {
    s.food_log_reminder_enabled
}

fn medication_enabled(s: &UserSettings) -> bool {
    s.medication_reminder_enabled
}

fn insulin_enabled(s: &UserSettings) -> bool {
    s.insulin_reminder_enabled
}

/// Notifications for every enabled reminder flag, in a fixed order.
///
/// Missing settings are [`debie_core::error::FetchError::NotFound`].
pub async fn pending_notifications(
    fetcher: &DataFetcher,
    subject: Uuid,
    cache: Option<&ContextCache>,
) -> Result<Vec<Notification>> {
    let settings = fetcher.user_settings(subject, cache).await?.data;
    let created_at = fetcher.clock().now();

    Ok(REMINDERS
        .iter()
        .filter(|r| (r.enabled)(&settings))
        .map(|r| Notification {
            notification_type: r.notification_type.to_string(),
            title: r.title.to_string(),
            message: r.message.to_string(),
            priority: r.priority,
            created_at,
        })
        .collect())
}
