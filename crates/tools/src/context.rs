//! Context aggregation: one consolidated snapshot of a subject's health data.
//!
//! The aggregator runs every per-domain fetch sequentially, then the
//! capability-gated ones, and folds the results into a [`ContextSnapshot`].
//! It never fails. A slot whose fetch failed keeps its empty default and is
//! listed in [`ContextSnapshot::unavailable`]. The snapshot itself is cached
//! under its own key with the longer aggregate TTL.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use debie_core::error::Result;
use debie_core::insight::AiInsight;
use debie_core::integration::{CalendarEvent, CalendarService, FitnessSummary, FitnessTracker};
use debie_core::profile::{UserProfile, UserSettings};
use debie_core::records::{
    BiometricReading, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog,
};
use debie_core::window::LookbackWindow;

use crate::cache::{CacheKey, ContextCache, EntityKind};
use crate::capability::{self, Capability};
use crate::fetch::{DataFetcher, Provenance, bounded};
use crate::summary::{
    ExerciseSummary, FoodSummary, GlucoseStatistics, InsulinSummary, MedicationSummary,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    pub glucose: Vec<GlucoseReading>,
    pub food: Vec<FoodLog>,
    pub medication: Vec<MedicationLog>,
    pub exercise: Vec<ExerciseLog>,
    /// Empty unless the insulin capability is enabled.
    pub insulin: Vec<InsulinLog>,
    /// Keyed by snake-cased type name (`heart_rate`, `steps`...).
    pub biometrics: BTreeMap<String, Vec<BiometricReading>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStatistics {
    pub glucose: GlucoseStatistics,
    pub food: FoodSummary,
    pub medication: MedicationSummary,
    pub exercise: ExerciseSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulin: Option<InsulinSummary>,
    pub biometric_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub user_id: Uuid,
    pub profile: Option<UserProfile>,
    pub settings: Option<UserSettings>,
    pub health: HealthData,
    pub statistics: SnapshotStatistics,
    pub fitness: Option<FitnessSummary>,
    pub calendar_events: Vec<CalendarEvent>,
    pub recent_insights: Vec<AiInsight>,
    /// Capabilities the profile enabled.
    pub capabilities: Vec<Capability>,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    /// Slots whose fetch failed and hold their empty default.
    pub unavailable: Vec<EntityKind>,
}

impl ContextSnapshot {
    pub fn is_complete(&self) -> bool {
        self.unavailable.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextReport {
    pub snapshot: ContextSnapshot,
    pub source: Provenance,
}

pub struct ContextAggregator {
    fetcher: DataFetcher,
    tracker: Option<Arc<dyn FitnessTracker>>,
    calendar: Option<Arc<dyn CalendarService>>,
}

/// Unwrap a slot result, noting the failure.
fn slot<T>(subject: Uuid, kind: EntityKind, result: Result<T>, unavailable: &mut Vec<EntityKind>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%subject, %kind, error = %e, "Snapshot slot unavailable");
            unavailable.push(kind);
            None
        }
    }
}

impl ContextAggregator {
    pub fn new(fetcher: DataFetcher) -> Self {
        Self {
            fetcher,
            tracker: None,
            calendar: None,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn FitnessTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarService>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn fetcher(&self) -> &DataFetcher {
        &self.fetcher
    }

    pub async fn snapshot(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> ContextReport {
        let key = CacheKey::new(EntityKind::Snapshot, subject, Some(window));
        let ttl = self.fetcher.settings().aggregate_ttl;
        if let Some((snapshot, _)) = self.fetcher.cached(cache, &key, ttl).await {
            return ContextReport {
                snapshot,
                source: Provenance::Cache,
            };
        }

        debug!(%subject, %window, "Assembling context snapshot");
        let snapshot = self.assemble(subject, cache, window).await;
        if !snapshot.is_complete() {
            info!(%subject, unavailable = ?snapshot.unavailable, "Snapshot assembled with gaps");
        }
        self.fetcher.remember(cache, key, &snapshot, None).await;

        ContextReport {
            snapshot,
            source: Provenance::Live,
        }
    }

    async fn assemble(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> ContextSnapshot {
        let f = &self.fetcher;
        let mut unavailable = Vec::new();
        let mut health = HealthData::default();
        let mut statistics = SnapshotStatistics::default();

        let profile = slot(subject, EntityKind::Profile, f.user_profile(subject, cache).await, &mut unavailable)
            .map(|p| p.data);
        let settings = slot(subject, EntityKind::Settings, f.user_settings(subject, cache).await, &mut unavailable)
            .map(|s| s.data);

        if let Some(r) = slot(subject, EntityKind::Glucose, f.glucose_readings(subject, cache, window).await, &mut unavailable) {
            health.glucose = r.records;
            statistics.glucose = r.summary;
        }
        if let Some(r) = slot(subject, EntityKind::Food, f.food_logs(subject, cache, window).await, &mut unavailable) {
            health.food = r.records;
            statistics.food = r.summary;
        }
        if let Some(r) = slot(subject, EntityKind::Medication, f.medication_logs(subject, cache, window).await, &mut unavailable) {
            health.medication = r.records;
            statistics.medication = r.summary;
        }
        if let Some(r) = slot(subject, EntityKind::Exercise, f.exercise_logs(subject, cache, window).await, &mut unavailable) {
            health.exercise = r.records;
            statistics.exercise = r.summary;
        }
        if let Some(r) = slot(subject, EntityKind::Biometrics, f.biometric_data(subject, cache, window).await, &mut unavailable) {
            health.biometrics = r.summary.by_type;
            statistics.biometric_counts = r.summary.counts;
        }
        let recent_insights = slot(subject, EntityKind::Insights, f.recent_insights(subject, cache).await, &mut unavailable)
            .map(|i| i.data)
            .unwrap_or_default();

        let capabilities = profile.as_ref().map(capability::enabled_for).unwrap_or_default();
        let mut fitness = None;
        for cap in &capabilities {
            match cap {
                Capability::InsulinRecords => {
                    if let Some(r) = slot(subject, EntityKind::Insulin, f.insulin_logs(subject, cache, window).await, &mut unavailable) {
                        health.insulin = r.records;
                        statistics.insulin = Some(r.summary);
                    }
                }
                Capability::FitnessTracker => {
                    let Some(tracker) = &self.tracker else {
                        debug!(%subject, "Fitness capability enabled but no tracker configured");
                        continue;
                    };
                    let yesterday = (f.clock().now() - TimeDelta::days(1)).date_naive();
                    let limit = f.settings().upstream_timeout;
                    fitness = slot(
                        subject,
                        EntityKind::Fitness,
                        bounded(tracker.name(), limit, tracker.daily_summary(yesterday)).await,
                        &mut unavailable,
                    );
                }
            }
        }

        let mut calendar_events = Vec::new();
        if let Some(calendar) = &self.calendar {
            let limit = f.settings().upstream_timeout;
            let events = match window.range_starting_at(f.clock().now()) {
                Ok(ahead) => bounded(calendar.name(), limit, calendar.list_events(ahead.start, ahead.end)).await,
                Err(e) => Err(e),
            };
            calendar_events = slot(subject, EntityKind::Calendar, events, &mut unavailable).unwrap_or_default();
        }

        ContextSnapshot {
            user_id: subject,
            profile,
            settings,
            health,
            statistics,
            fitness,
            calendar_events,
            recent_insights,
            capabilities,
            period: window.label(),
            generated_at: f.clock().now(),
            unavailable,
        }
    }
}
