//! Putting health activities on the user's calendar.
//!
//! [`EventRequest`] is a free-form event with the default popup ladder
//! (a day, an hour and 15 minutes before). [`HealthActivity`] covers the
//! typed activities (workouts, meals, medication and glucose checks), each
//! with its own title, duration, logging note and colour.
//! [`upcoming_events`] lists what is already scheduled.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use debie_core::error::{FetchError, Result};
use debie_core::integration::{
    CalendarEvent, CalendarService, EventReminders, EventTime, NewCalendarEvent, ReminderOverride,
};
use debie_core::window::LookbackWindow;

use crate::fetch::bounded;
use crate::reminders::EventCategory;

/// Popups for a free-form event when none are requested, in minutes before.
pub const DEFAULT_POPUPS: [u32; 3] = [24 * 60, 60, 15];

pub const DEFAULT_MEAL_MINUTES: i64 = 30;
pub const MEDICATION_MINUTES: i64 = 15;
pub const GLUCOSE_CHECK_MINUTES: i64 = 5;

/// Colour family of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventColor {
    Exercise,
    Medication,
    Meal,
    GlucoseCheck,
    Doctor,
    Logging,
    Other,
}

// Google Calendar palette: 3 grape, 5 banana, 6 tangerine, 7 peacock,
// 8 graphite, 9 blueberry, 11 tomato.
const COLORS: &[(EventColor, &str)] = &[
    (EventColor::Exercise, "7"),
    (EventColor::Medication, "3"),
    (EventColor::Meal, "5"),
    (EventColor::GlucoseCheck, "6"),
    (EventColor::Doctor, "9"),
    (EventColor::Logging, "11"),
    (EventColor::Other, "8"),
];

impl EventColor {
    pub fn color_id(&self) -> &'static str {
        COLORS
            .iter()
            .find(|(color, _)| color == self)
            .map(|(_, id)| *id)
            .unwrap_or("8")
    }
}

impl From<EventCategory> for EventColor {
    fn from(category: EventCategory) -> Self {
        match category {
            EventCategory::Medication => Self::Medication,
            EventCategory::Meal => Self::Meal,
            EventCategory::Exercise => Self::Exercise,
            EventCategory::GlucoseCheck => Self::GlucoseCheck,
            EventCategory::Other => Self::Other,
        }
    }
}

/// `at + minutes`, or `InvalidInput` when the result is not a valid date.
pub(crate) fn after_minutes(at: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_minutes(minutes)
        .and_then(|offset| at.checked_add_signed(offset))
        .ok_or_else(|| {
            FetchError::InvalidInput(format!(
                "{minutes} minutes after {at} is outside the supported date range"
            ))
        })
}

fn popups(minutes: &[u32]) -> EventReminders {
    EventReminders {
        use_default: false,
        overrides: minutes
            .iter()
            .map(|&m| ReminderOverride {
                method: "popup".into(),
                minutes: m,
            })
            .collect(),
    }
}

/// Requested popups, or the calendar's own defaults.
fn requested_or_calendar_default(minutes: Option<&[u32]>) -> EventReminders {
    match minutes {
        Some(m) if !m.is_empty() => popups(m),
        _ => EventReminders {
            use_default: true,
            overrides: Vec::new(),
        },
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn with_note(description: &str, note: &str) -> String {
    match non_empty(description) {
        Some(description) => format!("{description}\n\n{note}"),
        None => note.to_string(),
    }
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(FetchError::InvalidInput("event title must not be empty".into()));
    }
    Ok(())
}

/// A free-form calendar event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRequest {
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// Popup offsets in minutes; [`DEFAULT_POPUPS`] when absent or empty.
    #[serde(default)]
    pub reminders: Option<Vec<u32>>,
}

pub fn plan_event(request: &EventRequest) -> Result<NewCalendarEvent> {
    require_title(&request.summary)?;
    if request.end_time <= request.start_time {
        return Err(FetchError::InvalidInput(format!(
            "event must end after it starts ({} .. {})",
            request.start_time, request.end_time
        )));
    }
    let reminders = match request.reminders.as_deref() {
        Some(m) if !m.is_empty() => popups(m),
        _ => popups(&DEFAULT_POPUPS),
    };
    Ok(NewCalendarEvent {
        summary: request.summary.trim().to_string(),
        description: non_empty(&request.description),
        location: non_empty(&request.location),
        start: EventTime::at(request.start_time),
        end: EventTime::at(request.end_time),
        reminders,
        extended_properties: None,
        color_id: None,
    })
}

fn default_meal_minutes() -> i64 {
    DEFAULT_MEAL_MINUTES
}

fn default_check_context() -> String {
    "Regular check".into()
}

/// A health activity to schedule. Deserialized from `{"kind": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthActivity {
    Workout {
        title: String,
        start_time: DateTime<Utc>,
        duration_minutes: i64,
        #[serde(default)]
        description: String,
        #[serde(default)]
        location: String,
    },
    Meal {
        title: String,
        start_time: DateTime<Utc>,
        #[serde(default = "default_meal_minutes")]
        duration_minutes: i64,
        #[serde(default)]
        description: String,
    },
    Medication {
        title: String,
        start_time: DateTime<Utc>,
        dosage: String,
        frequency: String,
    },
    GlucoseCheck {
        start_time: DateTime<Utc>,
        #[serde(default = "default_check_context")]
        context: String,
    },
}

impl HealthActivity {
    pub fn color(&self) -> EventColor {
        match self {
            Self::Workout { .. } => EventColor::Exercise,
            Self::Meal { .. } => EventColor::Meal,
            Self::Medication { .. } => EventColor::Medication,
            Self::GlucoseCheck { .. } => EventColor::GlucoseCheck,
        }
    }

    fn start_time(&self) -> DateTime<Utc> {
        match self {
            Self::Workout { start_time, .. }
            | Self::Meal { start_time, .. }
            | Self::Medication { start_time, .. }
            | Self::GlucoseCheck { start_time, .. } => *start_time,
        }
    }

    /// Build the insert payload. `reminders` are popup offsets in minutes;
    /// without them the calendar's defaults apply.
    pub fn plan(&self, reminders: Option<&[u32]>) -> Result<NewCalendarEvent> {
        let (summary, description, location, minutes) = match self {
            Self::Workout {
                title,
                duration_minutes,
                description,
                location,
                ..
            } => {
                require_title(title)?;
                (
                    title.trim().to_string(),
                    with_note(description, "Don't forget to log your workout details after completion!"),
                    non_empty(location),
                    *duration_minutes,
                )
            }
            Self::Meal {
                title,
                duration_minutes,
                description,
                ..
            } => {
                require_title(title)?;
                (
                    title.trim().to_string(),
                    with_note(description, "Remember to log your meal details!"),
                    None,
                    *duration_minutes,
                )
            }
            Self::Medication {
                title,
                dosage,
                frequency,
                ..
            } => {
                require_title(title)?;
                let title = title.trim();
                (
                    format!("Medicine: {title}"),
                    format!(
                        "Medication: {title}\nDosage: {dosage}\nFrequency: {frequency}\n\n\
                         Please log your medication after taking it."
                    ),
                    None,
                    MEDICATION_MINUTES,
                )
            }
            Self::GlucoseCheck { context, .. } => (
                "Glucose Check".to_string(),
                format!("Context: {context}\n\nPlease log your glucose reading after checking."),
                None,
                GLUCOSE_CHECK_MINUTES,
            ),
        };
        if minutes <= 0 {
            return Err(FetchError::InvalidInput(format!(
                "duration_minutes must be positive, got {minutes}"
            )));
        }

        let start = self.start_time();
        let end = after_minutes(start, minutes)?;
        Ok(NewCalendarEvent {
            summary,
            description: Some(description),
            location,
            start: EventTime::at(start),
            end: EventTime::at(end),
            reminders: requested_or_calendar_default(reminders),
            extended_properties: None,
            color_id: Some(self.color().color_id().to_string()),
        })
    }
}

pub async fn create_event(
    calendar: &dyn CalendarService,
    limit: Duration,
    request: &EventRequest,
) -> Result<CalendarEvent> {
    let planned = plan_event(request)?;
    let created = bounded(calendar.name(), limit, calendar.create_event(&planned)).await?;
    info!(event = %created.id, "Calendar event created");
    Ok(created)
}

pub async fn schedule_activity(
    calendar: &dyn CalendarService,
    limit: Duration,
    activity: &HealthActivity,
    reminders: Option<&[u32]>,
) -> Result<CalendarEvent> {
    let planned = activity.plan(reminders)?;
    let created = bounded(calendar.name(), limit, calendar.create_event(&planned)).await?;
    info!(event = %created.id, color = ?activity.color(), "Health activity scheduled");
    Ok(created)
}

/// One upcoming event, flattened for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListing {
    pub id: String,
    pub summary: String,
    /// RFC 3339 instant, or `YYYY-MM-DD` for all-day events.
    pub start: String,
    pub end: String,
    pub description: String,
    pub location: String,
}

fn when(time: &EventTime) -> String {
    match (time.date_time, time.date) {
        (Some(at), _) => at.to_rfc3339(),
        (None, Some(date)) => date.to_string(),
        (None, None) => String::new(),
    }
}

impl From<CalendarEvent> for EventListing {
    fn from(event: CalendarEvent) -> Self {
        Self {
            start: when(&event.start),
            end: when(&event.end),
            id: event.id,
            summary: event.summary,
            description: event.description.unwrap_or_default(),
            location: event.location.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingEvents {
    pub events: Vec<EventListing>,
    pub count: usize,
    /// e.g. `"Next 7 days"`
    pub period: String,
}

/// Events starting in `[now, now + window]`.
pub async fn upcoming_events(
    calendar: &dyn CalendarService,
    limit: Duration,
    now: DateTime<Utc>,
    window: LookbackWindow,
) -> Result<UpcomingEvents> {
    let ahead = window.range_starting_at(now)?;
    let events: Vec<EventListing> = bounded(calendar.name(), limit, calendar.list_events(ahead.start, ahead.end))
        .await?
        .into_iter()
        .map(EventListing::from)
        .collect();
    Ok(UpcomingEvents {
        count: events.len(),
        events,
        period: format!("Next {} days", window.get()),
    })
}
