//! Calendar tools: event classification, listing and scheduling, and
//! follow-up log reminders.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use debie_core::clock::Clock;
use debie_core::error::ToolError;
use debie_core::integration::CalendarService;
use debie_core::tool::{Tool, ToolResult};
use debie_core::window::LookbackWindow;

use crate::args::{parse, respond};
use crate::reminders::{DEFAULT_MINUTES_AFTER, categorize_event, create_log_reminder};
use crate::schedule::{
    DEFAULT_MEAL_MINUTES, EventRequest, HealthActivity, create_event, schedule_activity,
    upcoming_events,
};
use crate::services::HealthServices;

pub struct CategorizeEventTool;

#[derive(Deserialize)]
struct CategorizeArgs {
    summary: String,
}

#[async_trait]
impl Tool for CategorizeEventTool {
    fn name(&self) -> &str {
        "categorize_calendar_event"
    }

    fn description(&self) -> &str {
        "Classify a calendar event title as medication, meal, exercise, glucose_check or other."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string", "description": "Event title" }
            },
            "required": ["summary"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: CategorizeArgs = parse(arguments)?;
        let category = categorize_event(&args.summary);
        Ok(ToolResult::ok(json!({
            "category": category,
            "activity": category.activity(),
        })))
    }
}

/// Registered only when a calendar is configured.
pub struct LogReminderTool {
    services: Arc<HealthServices>,
    calendar: Arc<dyn CalendarService>,
}

impl LogReminderTool {
    pub fn new(services: Arc<HealthServices>, calendar: Arc<dyn CalendarService>) -> Self {
        Self { services, calendar }
    }
}

#[derive(Deserialize)]
struct ReminderArgs {
    parent_event_id: String,
    activity_type: String,
    #[serde(default = "default_minutes_after")]
    minutes_after: i64,
}

fn default_minutes_after() -> i64 {
    DEFAULT_MINUTES_AFTER
}

#[async_trait]
impl Tool for LogReminderTool {
    fn name(&self) -> &str {
        "create_log_reminder"
    }

    fn description(&self) -> &str {
        "Schedule a 15-minute 'log it now' calendar reminder after an existing event \
         (medication, meal, exercise or glucose check)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "parent_event_id": { "type": "string" },
                "activity_type": {
                    "type": "string",
                    "enum": ["medication", "meal", "exercise", "glucose"]
                },
                "minutes_after": { "type": "integer", "minimum": 0, "default": 15 }
            },
            "required": ["parent_event_id", "activity_type"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ReminderArgs = parse(arguments)?;
        let limit = self.services.fetcher.settings().upstream_timeout;
        let created = create_log_reminder(
            self.calendar.as_ref(),
            limit,
            &args.parent_event_id,
            &args.activity_type,
            args.minutes_after,
        )
        .await;
        respond(self.name(), created)
    }
}

/// Registered only when a calendar is configured.
pub struct CalendarEventsTool {
    services: Arc<HealthServices>,
    calendar: Arc<dyn CalendarService>,
}

impl CalendarEventsTool {
    pub fn new(services: Arc<HealthServices>, calendar: Arc<dyn CalendarService>) -> Self {
        Self { services, calendar }
    }
}

#[derive(Deserialize)]
struct UpcomingArgs {
    #[serde(default)]
    days: LookbackWindow,
}

#[async_trait]
impl Tool for CalendarEventsTool {
    fn name(&self) -> &str {
        "get_calendar_events"
    }

    fn description(&self) -> &str {
        "Upcoming calendar events for the next N days."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 7,
                    "description": "Number of days ahead to look"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: UpcomingArgs = parse(arguments)?;
        let fetcher = &self.services.fetcher;
        let upcoming = upcoming_events(
            self.calendar.as_ref(),
            fetcher.settings().upstream_timeout,
            fetcher.clock().now(),
            args.days,
        )
        .await;
        respond(self.name(), upcoming)
    }
}

fn reminders_schema() -> serde_json::Value {
    json!({
        "type": "array",
        "items": { "type": "integer", "minimum": 0 },
        "description": "Popup reminders, in minutes before the event"
    })
}

/// Registered only when a calendar is configured.
pub struct CreateEventTool {
    services: Arc<HealthServices>,
    calendar: Arc<dyn CalendarService>,
}

impl CreateEventTool {
    pub fn new(services: Arc<HealthServices>, calendar: Arc<dyn CalendarService>) -> Self {
        Self { services, calendar }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn name(&self) -> &str {
        "create_calendar_event"
    }

    fn description(&self) -> &str {
        "Create a calendar event. Without explicit reminders it pops up a day, an hour \
         and 15 minutes before."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string", "description": "Event title" },
                "start_time": { "type": "string", "format": "date-time" },
                "end_time": { "type": "string", "format": "date-time" },
                "description": { "type": "string" },
                "location": { "type": "string" },
                "reminders": reminders_schema()
            },
            "required": ["summary", "start_time", "end_time"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let request: EventRequest = parse(arguments)?;
        let limit = self.services.fetcher.settings().upstream_timeout;
        let created = create_event(self.calendar.as_ref(), limit, &request).await;
        respond(self.name(), created)
    }
}

/// Registered only when a calendar is configured.
pub struct ScheduleActivityTool {
    services: Arc<HealthServices>,
    calendar: Arc<dyn CalendarService>,
}

impl ScheduleActivityTool {
    pub fn new(services: Arc<HealthServices>, calendar: Arc<dyn CalendarService>) -> Self {
        Self { services, calendar }
    }
}

#[derive(Deserialize)]
struct ScheduleArgs {
    #[serde(flatten)]
    activity: HealthActivity,
    #[serde(default)]
    reminders: Option<Vec<u32>>,
}

#[async_trait]
impl Tool for ScheduleActivityTool {
    fn name(&self) -> &str {
        "schedule_health_activity"
    }

    fn description(&self) -> &str {
        "Put a workout, meal, medication dose or glucose check on the calendar, \
         colour-coded and with a note to log it afterwards."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "kind": {
                    "type": "string",
                    "enum": ["workout", "meal", "medication", "glucose_check"]
                },
                "title": { "type": "string", "description": "Not used for glucose_check" },
                "start_time": { "type": "string", "format": "date-time" },
                "duration_minutes": {
                    "type": "integer",
                    "minimum": 1,
                    "description": format!(
                        "Workout (required) and meal (default {DEFAULT_MEAL_MINUTES}) only"
                    )
                },
                "description": { "type": "string" },
                "location": { "type": "string", "description": "Workout only" },
                "dosage": { "type": "string", "description": "Medication only" },
                "frequency": { "type": "string", "description": "Medication only" },
                "context": { "type": "string", "description": "Glucose check only" },
                "reminders": reminders_schema()
            },
            "required": ["kind", "start_time"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: ScheduleArgs = parse(arguments)?;
        let limit = self.services.fetcher.settings().upstream_timeout;
        let created = schedule_activity(
            self.calendar.as_ref(),
            limit,
            &args.activity,
            args.reminders.as_deref(),
        )
        .await;
        respond(self.name(), created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, StubCalendar};
    use chrono::{TimeDelta, TimeZone, Utc};
    use debie_core::integration::{CalendarEvent, EventTime};

    fn calendar_services(fx: &Fixture) -> Arc<HealthServices> {
        Arc::new(HealthServices::new(fx.fetcher.clone()))
    }

    #[tokio::test]
    async fn categorize_reports_activity() {
        let data = CategorizeEventTool
            .execute(json!({"summary": "Evening run"}))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["category"], "exercise");
        assert_eq!(data["activity"], "exercise");

        let other = CategorizeEventTool
            .execute(json!({"summary": "Team sync"}))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(other["category"], "other");
        assert!(other["activity"].is_null());
    }

    #[tokio::test]
    async fn reminder_tool_creates_event() {
        let fx = Fixture::new().await;
        let end = Utc.with_ymd_and_hms(2026, 3, 11, 19, 0, 0).unwrap();
        let calendar = Arc::new(StubCalendar::with_event(CalendarEvent {
            id: "dinner-1".into(),
            summary: "Dinner".into(),
            description: None,
            location: None,
            start: EventTime::at(end),
            end: EventTime::at(end),
            html_link: None,
            extended_properties: None,
        }));
        let services = Arc::new(HealthServices::new(fx.fetcher.clone()));
        let tool = LogReminderTool::new(services, calendar.clone());

        let result = tool
            .execute(json!({"parent_event_id": "dinner-1", "activity_type": "meal"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.data.unwrap()["summary"], "Log your meal");
        assert_eq!(calendar.created()[0].extended_properties.as_ref().unwrap().private["parentEventId"], "dinner-1");
    }

    #[tokio::test]
    async fn negative_offset_is_invalid() {
        let fx = Fixture::new().await;
        let calendar = Arc::new(StubCalendar::with_event(CalendarEvent {
            id: "e".into(),
            summary: "Pill".into(),
            description: None,
            location: None,
            start: EventTime::at(Utc::now()),
            end: EventTime::at(Utc::now()),
            html_link: None,
            extended_properties: None,
        }));
        let tool = LogReminderTool::new(Arc::new(HealthServices::new(fx.fetcher.clone())), calendar);
        let err = tool
            .execute(json!({"parent_event_id": "e", "activity_type": "medication", "minutes_after": -5}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn offset_past_supported_dates_is_invalid() {
        let fx = Fixture::new().await;
        let end = Utc.with_ymd_and_hms(2026, 3, 11, 19, 0, 0).unwrap();
        let calendar = Arc::new(StubCalendar::with_event(CalendarEvent {
            id: "dinner-1".into(),
            summary: "Dinner".into(),
            description: None,
            location: None,
            start: EventTime::at(end),
            end: EventTime::at(end),
            html_link: None,
            extended_properties: None,
        }));
        let tool = LogReminderTool::new(calendar_services(&fx), calendar.clone());
        let err = tool
            .execute(json!({
                "parent_event_id": "dinner-1",
                "activity_type": "meal",
                "minutes_after": 1_000_000_000_000i64
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(calendar.created().is_empty());
    }

    #[tokio::test]
    async fn calendar_events_for_next_days() {
        let fx = Fixture::new().await;
        let at = fx.clock.now() + TimeDelta::days(1);
        let calendar = Arc::new(StubCalendar::with_event(CalendarEvent {
            id: "walk-1".into(),
            summary: "Evening walk".into(),
            description: Some("Around the park".into()),
            location: None,
            start: EventTime::at(at),
            end: EventTime::at(at + TimeDelta::minutes(30)),
            html_link: None,
            extended_properties: None,
        }));
        let tool = CalendarEventsTool::new(calendar_services(&fx), calendar);

        let data = tool.execute(json!({})).await.unwrap().data.unwrap();
        assert_eq!(data["period"], "Next 7 days");
        assert_eq!(data["count"], 1);
        assert_eq!(data["events"][0]["id"], "walk-1");
        assert_eq!(data["events"][0]["description"], "Around the park");
        assert_eq!(data["events"][0]["location"], "");

        let err = tool.execute(json!({"days": 0})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn create_event_uses_default_popups() {
        let fx = Fixture::new().await;
        let calendar = Arc::new(StubCalendar::default());
        let tool = CreateEventTool::new(calendar_services(&fx), calendar.clone());

        let result = tool
            .execute(json!({
                "summary": "Endocrinologist",
                "start_time": "2026-03-20T15:00:00Z",
                "end_time": "2026-03-20T16:00:00Z"
            }))
            .await
            .unwrap();
        assert!(result.success);
        let created = calendar.created();
        let popups: Vec<u32> = created[0].reminders.overrides.iter().map(|o| o.minutes).collect();
        assert_eq!(popups, vec![1440, 60, 15]);

        let err = tool
            .execute(json!({
                "summary": "Backwards",
                "start_time": "2026-03-20T16:00:00Z",
                "end_time": "2026-03-20T15:00:00Z"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn schedule_medication_is_colour_coded() {
        let fx = Fixture::new().await;
        let calendar = Arc::new(StubCalendar::default());
        let tool = ScheduleActivityTool::new(calendar_services(&fx), calendar.clone());

        let result = tool
            .execute(json!({
                "kind": "medication",
                "title": "Metformin",
                "start_time": "2026-03-20T08:00:00Z",
                "dosage": "500mg",
                "frequency": "daily",
                "reminders": [10]
            }))
            .await
            .unwrap();
        assert_eq!(result.data.unwrap()["summary"], "Medicine: Metformin");
        let created = calendar.created();
        assert_eq!(created[0].color_id.as_deref(), Some("3"));
        assert_eq!(created[0].reminders.overrides[0].minutes, 10);

        let err = tool
            .execute(json!({
                "kind": "workout",
                "title": "Run",
                "start_time": "2026-03-20T08:00:00Z",
                "duration_minutes": 0
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
