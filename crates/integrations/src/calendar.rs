//! Google Calendar v3 client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use debie_config::CalendarConfig;
use debie_core::error::IntegrationError;
use debie_core::integration::{CalendarEvent, CalendarService, NewCalendarEvent};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarClient {
    base_url: String,
    calendar_id: String,
    access_token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

impl GoogleCalendarClient {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self, IntegrationError> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            calendar_id: "primary".into(),
            access_token: access_token.into(),
            client: crate::http_client(timeout)?,
        })
    }

    /// Build from `[calendar]` config. `None` when no token is configured.
    pub fn from_config(
        config: &CalendarConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, IntegrationError> {
        let Some(token) = &config.access_token else {
            return Ok(None);
        };
        Ok(Some(
            Self::new(token.clone(), timeout)?
                .with_base_url(&config.base_url)
                .with_calendar_id(&config.calendar_id),
        ))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, IntegrationError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| IntegrationError::Network(e.to_string()))?;

        crate::check_status("google_calendar", response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| IntegrationError::Decode(format!("Failed to parse calendar response: {e}")))
    }
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google_calendar"
    }

    async fn list_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, IntegrationError> {
        debug!(%from, %to, "Listing calendar events");
        let request = self.client.get(self.events_url()).query(&[
            ("timeMin", rfc3339(from)),
            ("timeMax", rfc3339(to)),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ]);
        let list: EventList = self.send_json(request).await?;
        Ok(list.items)
    }

    async fn get_event(&self, event_id: &str) -> Result<CalendarEvent, IntegrationError> {
        let url = format!("{}/{}", self.events_url(), event_id);
        self.send_json(self.client.get(url)).await
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent, IntegrationError> {
        debug!(summary = %event.summary, "Creating calendar event");
        self.send_json(self.client.post(self.events_url()).json(event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_url_uses_calendar_id() {
        let client = GoogleCalendarClient::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9001/")
            .with_calendar_id("team");
        assert_eq!(client.events_url(), "http://localhost:9001/calendars/team/events");
    }

    #[test]
    fn from_config_builds_when_token_present() {
        let config = CalendarConfig {
            access_token: Some("tok".into()),
            ..CalendarConfig::default()
        };
        let client = GoogleCalendarClient::from_config(&config, Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert!(client.events_url().ends_with("/calendars/primary/events"));
    }

    #[test]
    fn parse_event_list() {
        let data = r#"{
            "kind": "calendar#events",
            "items": [
                {
                    "id": "a1",
                    "summary": "Breakfast",
                    "htmlLink": "https://calendar.google.com/event?eid=a1",
                    "start": {"dateTime": "2026-03-02T08:00:00-08:00"},
                    "end": {"dateTime": "2026-03-02T08:30:00-08:00"}
                },
                {
                    "id": "a2",
                    "summary": "Clinic day",
                    "start": {"date": "2026-03-03"},
                    "end": {"date": "2026-03-04"}
                }
            ]
        }"#;
        let list: EventList = serde_json::from_str(data).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(
            list.items[0].start.date_time,
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap())
        );
        assert!(list.items[1].start.date_time.is_none());
    }

    #[test]
    fn query_times_are_utc_rfc3339() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        assert_eq!(rfc3339(at), "2026-03-02T08:00:00Z");
    }
}
