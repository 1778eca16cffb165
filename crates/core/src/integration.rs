//! Third-party integrations: a fitness tracker and a calendar.
//!
//! Both are optional. The aggregator only reaches them when the subject's
//! profile enables the capability and a client is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

type IntegrationResult<T> = std::result::Result<T, IntegrationError>;

// --- Fitness tracker ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub steps: u64,
    /// Kilometres, first entry of the tracker's distance list.
    pub distance: f64,
    pub calories: u64,
    /// Fairly plus very active minutes.
    pub active_minutes: u64,
    pub sedentary_minutes: u64,
    #[serde(default)]
    pub activities: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<u64>,
    #[serde(default)]
    pub heart_rate_zones: Vec<serde_json::Value>,
    #[serde(default)]
    pub intraday: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub total_minutes_asleep: u64,
    pub total_time_in_bed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<serde_json::Value>,
    #[serde(default)]
    pub sessions: Vec<serde_json::Value>,
}

/// One day of tracker data. Each part is `None` when its endpoint failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub date: NaiveDate,
    pub activity: Option<ActivitySummary>,
    pub heart_rate: Option<HeartRateSummary>,
    pub sleep: Option<SleepSummary>,
}

#[async_trait]
pub trait FitnessTracker: Send + Sync {
    fn name(&self) -> &str;

    /// Activity, heart-rate and sleep data for one calendar day.
    async fn daily_summary(&self, date: NaiveDate) -> IntegrationResult<FitnessSummary>;
}

// --- Calendar ---

/// Either a timed instant or an all-day date, as calendar APIs model it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: Some(instant),
            date: None,
            time_zone: Some("UTC".into()),
        }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date_time: None,
            date: Some(date),
            time_zone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReminders {
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

/// Insert payload for a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub reminders: EventReminders,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
    /// Google Calendar palette id, `"1"`..`"11"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    fn name(&self) -> &str;

    /// Events starting within `[from, to]`, ordered by start time.
    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> IntegrationResult<Vec<CalendarEvent>>;

    async fn get_event(&self, event_id: &str) -> IntegrationResult<CalendarEvent>;

    async fn create_event(&self, event: &NewCalendarEvent) -> IntegrationResult<CalendarEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_time_uses_calendar_field_names() {
        let json = serde_json::json!({
            "id": "evt1",
            "summary": "Lunch",
            "start": { "dateTime": "2026-03-02T12:00:00Z" },
            "end": { "date": "2026-03-02" }
        });
        let event: CalendarEvent = serde_json::from_value(json).unwrap();
        assert!(event.start.date_time.is_some());
        assert_eq!(event.end.date, NaiveDate::from_ymd_opt(2026, 3, 2));
    }

    #[test]
    fn reminders_serialize_camel_case() {
        let reminders = EventReminders {
            use_default: false,
            overrides: vec![ReminderOverride { method: "popup".into(), minutes: 0 }],
        };
        let json = serde_json::to_value(&reminders).unwrap();
        assert_eq!(json["useDefault"], false);
        assert_eq!(json["overrides"][0]["method"], "popup");
    }
}
