//! Shared fixtures for the unit tests in this crate.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use uuid::Uuid;

use debie_core::clock::{Clock, ManualClock};
use debie_core::error::IntegrationError;
use debie_core::integration::{
    ActivitySummary, CalendarEvent, CalendarService, FitnessSummary, FitnessTracker,
    NewCalendarEvent,
};
use debie_core::profile::{DiabetesType, UserProfile, UserSettings};
use debie_core::records::{BiometricReading, GlucoseReading, InsulinLog};
use debie_store::InMemoryStore;

use crate::fetch::{DataFetcher, FetchSettings};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).single().unwrap()
}

pub fn glucose(user: Uuid, at: DateTime<Utc>, value: f64) -> GlucoseReading {
    GlucoseReading {
        id: Uuid::new_v4(),
        user_id: user,
        reading_timestamp: at,
        glucose_value: value,
        reading_source: Some("CGM".into()),
    }
}

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub fetcher: DataFetcher,
    pub user: Uuid,
}

impl Fixture {
    /// A store holding one profile (type 2, no trackers) plus default settings.
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let user = Uuid::new_v4();

        let mut profile = UserProfile::new(user);
        profile.username = Some("dana".into());
        profile.diabetes_type = Some(DiabetesType::Type2);
        store.put_profile(profile).await;
        store.put_settings(UserSettings::defaults_for(user)).await;

        let fetcher = DataFetcher::new(store.clone(), clock.clone(), FetchSettings::default());
        Self { store, clock, fetcher, user }
    }

    /// One reading per value, an hour apart, ending an hour ago.
    pub async fn seed_glucose(&self, values: &[f64]) {
        let now = self.clock.now();
        for (i, value) in values.iter().enumerate() {
            let at = now - TimeDelta::hours(values.len() as i64 - i as i64);
            self.store.push_glucose(glucose(self.user, at, *value)).await;
        }
    }

    pub async fn seed_insulin(&self, doses: &[f64]) {
        let now = self.clock.now();
        for (i, units) in doses.iter().enumerate() {
            self.store
                .push_insulin(InsulinLog {
                    id: Uuid::new_v4(),
                    user_id: self.user,
                    log_timestamp: now - TimeDelta::hours(i as i64 + 1),
                    insulin_type: Some("rapid".into()),
                    dosage_units: *units,
                    notes: None,
                })
                .await;
        }
    }

    pub async fn seed_biometric(&self, kind: &str, value: f64) {
        self.store
            .push_biometric(BiometricReading {
                id: Uuid::new_v4(),
                user_id: self.user,
                reading_timestamp: self.clock.now() - TimeDelta::hours(2),
                biometric_type: kind.into(),
                value,
                systolic_bp: None,
                diastolic_bp: None,
                source: Some("manual".into()),
            })
            .await;
    }

    pub async fn update_profile(&self, edit: impl FnOnce(&mut UserProfile)) {
        let mut profile = UserProfile::new(self.user);
        profile.username = Some("dana".into());
        profile.diabetes_type = Some(DiabetesType::Type2);
        edit(&mut profile);
        self.store.put_profile(profile).await;
    }

    pub async fn set_diabetes_type(&self, kind: DiabetesType) {
        self.update_profile(|p| p.diabetes_type = Some(kind)).await;
    }

    pub async fn set_fitbit(&self, activated: bool) {
        self.update_profile(|p| p.is_fitbit_activated = activated).await;
    }
}

pub struct StubTracker {
    fail: bool,
}

impl StubTracker {
    pub fn ok() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl FitnessTracker for StubTracker {
    fn name(&self) -> &str {
        "stub-tracker"
    }

    async fn daily_summary(&self, date: NaiveDate) -> Result<FitnessSummary, IntegrationError> {
        if self.fail {
            return Err(IntegrationError::ApiError {
                status_code: 401,
                message: "expired token".into(),
            });
        }
        Ok(FitnessSummary {
            date,
            activity: Some(ActivitySummary {
                steps: 8421,
                ..Default::default()
            }),
            heart_rate: None,
            sleep: None,
        })
    }
}

/// Records created events and returns the stored ones from `list_events`.
#[derive(Default)]
pub struct StubCalendar {
    pub events: Mutex<Vec<CalendarEvent>>,
    pub created: Mutex<Vec<NewCalendarEvent>>,
}

impl StubCalendar {
    pub fn with_event(event: CalendarEvent) -> Self {
        let calendar = Self::default();
        calendar.events.lock().unwrap().push(event);
        calendar
    }

    pub fn created(&self) -> Vec<NewCalendarEvent> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarService for StubCalendar {
    fn name(&self) -> &str {
        "stub-calendar"
    }

    async fn list_events(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, IntegrationError> {
        Ok(self.events.lock().unwrap().clone())
    }

    async fn get_event(&self, event_id: &str) -> Result<CalendarEvent, IntegrationError> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| IntegrationError::ApiError {
                status_code: 404,
                message: format!("event {event_id} not found"),
            })
    }

    async fn create_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent, IntegrationError> {
        self.created.lock().unwrap().push(event.clone());
        Ok(CalendarEvent {
            id: format!("created-{}", self.created.lock().unwrap().len()),
            summary: event.summary.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start: event.start.clone(),
            end: event.end.clone(),
            html_link: None,
            extended_properties: event.extended_properties.clone(),
        })
    }
}
