//! Calendar helpers: classify scheduled events and plan follow-up
//! "log it now" reminders after them.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use debie_core::error::{FetchError, Result};
use debie_core::integration::{
    CalendarEvent, CalendarService, EventReminders, EventTime, ExtendedProperties,
    NewCalendarEvent, ReminderOverride,
};

use crate::fetch::bounded;
use crate::schedule::{EventColor, after_minutes};

/// Length of a planned reminder event.
pub const REMINDER_LENGTH_MINUTES: i64 = 15;
pub const DEFAULT_MINUTES_AFTER: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Medication,
    Meal,
    Exercise,
    GlucoseCheck,
    Other,
}

impl EventCategory {
    /// Activity name used in reminder titles and private properties.
    pub fn activity(&self) -> Option<&'static str> {
        match self {
            Self::Medication => Some("medication"),
            Self::Meal => Some("meal"),
            Self::Exercise => Some("exercise"),
            Self::GlucoseCheck => Some("glucose"),
            Self::Other => None,
        }
    }
}

// First matching row wins, so "check sugar before lunch" is a meal.
// Matching is by substring: "eat" also hits "great".
const KEYWORDS: &[(EventCategory, &[&str])] = &[
    (
        EventCategory::Medication,
        &["medicine", "medication", "pill", "insulin", "injection", "dose", "meds", "metformin"],
    ),
    (EventCategory::Meal, &["breakfast", "lunch", "dinner", "meal", "snack", "food", "eat"]),
    (
        EventCategory::Exercise,
        &["exercise", "workout", "walk", "run", "jog", "swim", "gym", "training"],
    ),
    (EventCategory::GlucoseCheck, &["glucose", "sugar", "check", "test", "reading", "meter"]),
];

pub fn categorize_event(summary: &str) -> EventCategory {
    let summary = summary.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| summary.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(EventCategory::Other)
}

fn reminder_title(activity: &str) -> String {
    match activity {
        "medication" => "Log your medication".into(),
        "meal" => "Log your meal".into(),
        "exercise" => "Log your workout".into(),
        "glucose" => "Log your glucose reading".into(),
        other => format!("Log your {other}"),
    }
}

/// When the parent ends. All-day parents anchor at 12:00 on their end date.
fn parent_end(parent: &CalendarEvent) -> Result<DateTime<Utc>> {
    if let Some(at) = parent.end.date_time {
        return Ok(at);
    }
    if let Some(date) = parent.end.date {
        return Ok(date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()).and_utc());
    }
    Err(FetchError::InvalidInput(format!(
        "event {} has neither an end time nor an end date",
        parent.id
    )))
}

/// Build the follow-up event for `parent`. Nothing is written.
pub fn plan_log_reminder(
    parent: &CalendarEvent,
    activity: &str,
    minutes_after: i64,
) -> Result<NewCalendarEvent> {
    let activity = activity.trim();
    if activity.is_empty() {
        return Err(FetchError::InvalidInput("activity_type must not be empty".into()));
    }
    if minutes_after < 0 {
        return Err(FetchError::InvalidInput(format!(
            "minutes_after must not be negative, got {minutes_after}"
        )));
    }

    let start = after_minutes(parent_end(parent)?, minutes_after)?;
    let end = after_minutes(start, REMINDER_LENGTH_MINUTES)?;
    let zone = |t: &EventTime| t.time_zone.clone().or_else(|| Some("UTC".into()));

    let mut private = BTreeMap::new();
    private.insert("parentEventId".to_string(), parent.id.clone());
    private.insert("isLoggingReminder".to_string(), "true".to_string());
    private.insert("activityType".to_string(), activity.to_string());

    Ok(NewCalendarEvent {
        summary: reminder_title(activity),
        description: Some(format!(
            "Time to log your {activity} from the earlier event: {}. Open the app to log now!",
            parent.summary
        )),
        location: None,
        start: EventTime {
            time_zone: zone(&parent.start),
            ..EventTime::at(start)
        },
        end: EventTime {
            time_zone: zone(&parent.end),
            ..EventTime::at(end)
        },
        reminders: EventReminders {
            use_default: false,
            overrides: vec![ReminderOverride {
                method: "popup".into(),
                minutes: 0,
            }],
        },
        extended_properties: Some(ExtendedProperties { private }),
        color_id: Some(EventColor::Logging.color_id().to_string()),
    })
}

/// Fetch the parent event, plan its reminder and create it.
pub async fn create_log_reminder(
    calendar: &dyn CalendarService,
    limit: Duration,
    parent_event_id: &str,
    activity: &str,
    minutes_after: i64,
) -> Result<CalendarEvent> {
    let parent = bounded(calendar.name(), limit, calendar.get_event(parent_event_id)).await?;
    let planned = plan_log_reminder(&parent, activity, minutes_after)?;
    let created = bounded(calendar.name(), limit, calendar.create_event(&planned)).await?;
    info!(parent = parent_event_id, reminder = %created.id, activity, "Log reminder created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubCalendar;
    use chrono::{NaiveDate, TimeDelta, TimeZone};
    use debie_core::error::ErrorKind;

    fn event(id: &str, summary: &str, end: EventTime) -> CalendarEvent {
        CalendarEvent {
            id: id.into(),
            summary: summary.into(),
            description: None,
            location: None,
            start: end.clone(),
            end,
            html_link: None,
            extended_properties: None,
        }
    }

    #[test]
    fn categories_by_keyword() {
        assert_eq!(categorize_event("Morning Metformin"), EventCategory::Medication);
        assert_eq!(categorize_event("Lunch with Sam"), EventCategory::Meal);
        assert_eq!(categorize_event("Gym - legs"), EventCategory::Exercise);
        assert_eq!(categorize_event("Check blood sugar"), EventCategory::GlucoseCheck);
        assert_eq!(categorize_event("Dentist"), EventCategory::Other);
        assert_eq!(categorize_event("Insulin before dinner"), EventCategory::Medication);
    }

    #[test]
    fn earlier_categories_win() {
        assert_eq!(categorize_event("Check blood sugar before lunch"), EventCategory::Meal);
        assert_eq!(categorize_event("Eat salad"), EventCategory::Meal);
        assert_eq!(categorize_event("Morning jog"), EventCategory::Exercise);
        assert_eq!(categorize_event("Test strips"), EventCategory::GlucoseCheck);
        assert_eq!(categorize_event("Meter calibration"), EventCategory::GlucoseCheck);
        assert_eq!(categorize_event("Insulin injection after run"), EventCategory::Medication);
        assert_eq!(categorize_event("Grocery food run"), EventCategory::Meal);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_value(EventCategory::GlucoseCheck).unwrap();
        assert_eq!(json, "glucose_check");
    }

    #[test]
    fn reminder_follows_timed_parent() {
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 13, 0, 0).unwrap();
        let parent = event("evt1", "Lunch", EventTime::at(end));

        let planned = plan_log_reminder(&parent, "meal", 15).unwrap();
        assert_eq!(planned.summary, "Log your meal");
        assert_eq!(planned.start.date_time, Some(end + TimeDelta::minutes(15)));
        assert_eq!(planned.end.date_time, Some(end + TimeDelta::minutes(30)));
        assert_eq!(planned.reminders.overrides[0].minutes, 0);
        let props = planned.extended_properties.unwrap().private;
        assert_eq!(props["parentEventId"], "evt1");
        assert_eq!(props["isLoggingReminder"], "true");
        assert_eq!(props["activityType"], "meal");
        assert_eq!(planned.color_id.as_deref(), Some("11"));
    }

    #[test]
    fn offset_past_supported_dates_is_invalid() {
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 13, 0, 0).unwrap();
        let parent = event("evt1", "Lunch", EventTime::at(end));

        for minutes in [1_000_000_000_000, i64::MAX] {
            let err = plan_log_reminder(&parent, "meal", minutes).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn all_day_parent_anchors_at_noon() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let parent = event("evt2", "Hiking day", EventTime::all_day(date));

        let planned = plan_log_reminder(&parent, "exercise", 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(planned.start.date_time, Some(noon));
        assert_eq!(planned.summary, "Log your workout");
    }

    #[test]
    fn unknown_activity_gets_generic_title() {
        let parent = event("evt3", "Nap", EventTime::at(Utc::now()));
        let planned = plan_log_reminder(&parent, "sleep", 5).unwrap();
        assert_eq!(planned.summary, "Log your sleep");
        assert!(plan_log_reminder(&parent, "sleep", -1).is_err());
    }

    #[tokio::test]
    async fn creates_reminder_through_calendar() {
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let calendar = StubCalendar::with_event(event("evt1", "Morning meds", EventTime::at(end)));

        let created = create_log_reminder(&calendar, Duration::from_secs(1), "evt1", "medication", 10)
            .await
            .unwrap();
        assert_eq!(created.summary, "Log your medication");
        assert_eq!(calendar.created().len(), 1);

        let missing = create_log_reminder(&calendar, Duration::from_secs(1), "nope", "meal", 10).await;
        assert!(missing.is_err());
    }
}
