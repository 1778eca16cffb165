//! Per-domain fetchers with read-through caching.
//!
//! Every fetch follows the same path: build the composite key, return the
//! cached copy when it is still fresh, otherwise query the store for the
//! inclusive window `[now - days, now]`, summarize, write back, and return.
//! Store failures and timeouts surface as
//! [`FetchError::UpstreamUnavailable`] and are never retried.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use debie_config::AppConfig;
use debie_core::clock::Clock;
use debie_core::error::{FetchError, Result, StoreError};
use debie_core::insight::AiInsight;
use debie_core::profile::{UserProfile, UserSettings};
use debie_core::records::{
    BiometricReading, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog,
};
use debie_core::store::HealthStore;
use debie_core::window::{LookbackWindow, TimeRange};

use crate::cache::{self, CacheKey, ContextCache, EntityKind};
use crate::summary::{
    self, BiometricSummary, ExerciseSummary, FoodSummary, GlucoseStatistics, InsulinSummary,
    MedicationSummary,
};

/// How many insights the recent-insights fetch returns.
pub const RECENT_INSIGHTS_LIMIT: usize = 5;
pub const RECENT_INSULIN_LIMIT: usize = 5;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Live,
}

/// Records for one category over a window, plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport<R, S> {
    pub records: Vec<R>,
    pub count: usize,
    /// e.g. `"Last 7 days"`
    pub period: String,
    pub summary: S,
    pub source: Provenance,
}

impl<R, S> DomainReport<R, S> {
    fn new(records: Vec<R>, summary: S, window: LookbackWindow, source: Provenance) -> Self {
        Self {
            count: records.len(),
            records,
            period: window.label(),
            summary,
            source,
        }
    }
}

pub type GlucoseReport = DomainReport<GlucoseReading, GlucoseStatistics>;
pub type FoodReport = DomainReport<FoodLog, FoodSummary>;
pub type MedicationReport = DomainReport<MedicationLog, MedicationSummary>;
pub type ExerciseReport = DomainReport<ExerciseLog, ExerciseSummary>;
pub type InsulinReport = DomainReport<InsulinLog, InsulinSummary>;
pub type BiometricReport = DomainReport<BiometricReading, BiometricSummary>;

/// A single un-ranged value (profile, settings, insights) and its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    pub data: T,
    pub source: Provenance,
}

/// TTLs, cache size and the per-call upstream bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub fetch_ttl: Duration,
    pub aggregate_ttl: Duration,
    pub upstream_timeout: Duration,
    pub cache_capacity: NonZeroUsize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            fetch_ttl: Duration::from_secs(300),
            aggregate_ttl: Duration::from_secs(1800),
            upstream_timeout: Duration::from_secs(10),
            cache_capacity: cache::DEFAULT_CAPACITY,
        }
    }
}

impl FetchSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fetch_ttl: config.cache.fetch_ttl(),
            aggregate_ttl: config.cache.aggregate_ttl(),
            upstream_timeout: config.upstream.timeout(),
            cache_capacity: NonZeroUsize::new(config.cache.max_entries).unwrap_or(cache::DEFAULT_CAPACITY),
        }
    }
}

/// Bound `fut` by `limit`, mapping elapsed time and errors to
/// [`FetchError::UpstreamUnavailable`].
pub async fn bounded<T, E, F>(what: impl std::fmt::Display, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    FetchError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(FetchError::from),
        Err(_) => Err(FetchError::UpstreamUnavailable(format!(
            "{what} timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}

fn encode<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "Cache payload not serializable, skipping write");
            None
        }
    }
}

/// Read-through access to the health store.
#[derive(Clone)]
pub struct DataFetcher {
    store: Arc<dyn HealthStore>,
    clock: Arc<dyn Clock>,
    settings: FetchSettings,
}

impl DataFetcher {
    pub fn new(store: Arc<dyn HealthStore>, clock: Arc<dyn Clock>, settings: FetchSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn HealthStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fresh cached value under `key`, decoded as `T`.
    pub(crate) async fn cached<T: DeserializeOwned>(
        &self,
        cache: Option<&ContextCache>,
        key: &CacheKey,
        ttl: Duration,
    ) -> Option<(T, Option<serde_json::Value>)> {
        let entry = cache?.get(key).await?;
        if !entry.is_fresh(self.clock.now(), ttl) {
            debug!(key = %key, "Cache stale");
            return None;
        }
        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Some((value, entry.summary))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached payload undecodable, refetching");
                None
            }
        }
    }

    pub(crate) async fn remember<T: Serialize>(
        &self,
        cache: Option<&ContextCache>,
        key: CacheKey,
        payload: &T,
        summary: Option<serde_json::Value>,
    ) {
        let Some(cache) = cache else { return };
        if let Some(payload) = encode(payload) {
            cache.put(key, payload, summary, self.clock.now()).await;
        }
    }

    async fn read_through<R, S, F, Fut>(
        &self,
        kind: EntityKind,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
        query: F,
        summarize: fn(&[R], LookbackWindow) -> S,
    ) -> Result<DomainReport<R, S>>
    where
        R: Serialize + DeserializeOwned,
        S: Serialize + DeserializeOwned,
        F: FnOnce(TimeRange) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<R>, StoreError>>,
    {
        let key = CacheKey::new(kind, subject, Some(window));

        if let Some((records, summary)) = self
            .cached::<Vec<R>>(cache, &key, self.settings.fetch_ttl)
            .await
        {
            let summary = summary
                .and_then(|s| serde_json::from_value::<S>(s).ok())
                .unwrap_or_else(|| summarize(&records, window));
            return Ok(DomainReport::new(records, summary, window, Provenance::Cache));
        }

        debug!(%subject, %kind, %window, "Cache miss, querying store");
        let range = window.range_ending_at(self.clock.now())?;
        let records = bounded(kind, self.settings.upstream_timeout, query(range))
            .await
            .inspect_err(|e| warn!(%subject, %kind, error = %e, "Fetch failed"))?;

        let summary = summarize(&records, window);
        self.remember(cache, key, &records, encode(&summary)).await;
        Ok(DomainReport::new(records, summary, window, Provenance::Live))
    }

    /// Profile for `subject`. Missing row is [`FetchError::NotFound`].
    pub async fn user_profile(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
    ) -> Result<Fetched<UserProfile>> {
        let key = CacheKey::new(EntityKind::Profile, subject, None);
        if let Some((data, _)) = self.cached(cache, &key, self.settings.fetch_ttl).await {
            return Ok(Fetched { data, source: Provenance::Cache });
        }

        let profile = bounded("profile", self.settings.upstream_timeout, self.store.user_profile(subject))
            .await?
            .ok_or_else(|| FetchError::NotFound(format!("user {subject}")))?;

        self.remember(cache, key, &profile, None).await;
        Ok(Fetched { data: profile, source: Provenance::Live })
    }

    /// Settings for `subject`. Missing row is [`FetchError::NotFound`].
    pub async fn user_settings(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
    ) -> Result<Fetched<UserSettings>> {
        let key = CacheKey::new(EntityKind::Settings, subject, None);
        if let Some((data, _)) = self.cached(cache, &key, self.settings.fetch_ttl).await {
            return Ok(Fetched { data, source: Provenance::Cache });
        }

        let settings = bounded("settings", self.settings.upstream_timeout, self.store.user_settings(subject))
            .await?
            .ok_or_else(|| FetchError::NotFound(format!("settings for user {subject}")))?;

        self.remember(cache, key, &settings, None).await;
        Ok(Fetched { data: settings, source: Provenance::Live })
    }

    pub async fn glucose_readings(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> Result<GlucoseReport> {
        let store = &self.store;
        self.read_through(
            EntityKind::Glucose,
            subject,
            cache,
            window,
            |range| async move { store.glucose_readings(subject, &range).await },
            summary::glucose_statistics,
        )
        .await
    }

    pub async fn food_logs(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> Result<FoodReport> {
        let store = &self.store;
        self.read_through(
            EntityKind::Food,
            subject,
            cache,
            window,
            |range| async move { store.food_logs(subject, &range).await },
            summary::food_summary,
        )
        .await
    }

    pub async fn medication_logs(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> Result<MedicationReport> {
        let store = &self.store;
        self.read_through(
            EntityKind::Medication,
            subject,
            cache,
            window,
            |range| async move { store.medication_logs(subject, &range).await },
            summary::medication_summary,
        )
        .await
    }

    pub async fn exercise_logs(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> Result<ExerciseReport> {
        let store = &self.store;
        self.read_through(
            EntityKind::Exercise,
            subject,
            cache,
            window,
            |range| async move { store.exercise_logs(subject, &range).await },
            summary::exercise_summary,
        )
        .await
    }

    pub async fn insulin_logs(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> Result<InsulinReport> {
        let store = &self.store;
        self.read_through(
            EntityKind::Insulin,
            subject,
            cache,
            window,
            |range| async move { store.insulin_logs(subject, &range).await },
            summary::insulin_summary,
        )
        .await
    }

    /// The [`RECENT_INSULIN_LIMIT`] newest insulin logs, however old.
    pub async fn recent_insulin_logs(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
    ) -> Result<Fetched<Vec<InsulinLog>>> {
        let key = CacheKey::new(EntityKind::Insulin, subject, None);
        if let Some((data, _)) = self.cached(cache, &key, self.settings.fetch_ttl).await {
            return Ok(Fetched { data, source: Provenance::Cache });
        }

        let logs = bounded(
            EntityKind::Insulin,
            self.settings.upstream_timeout,
            self.store.recent_insulin_logs(subject, RECENT_INSULIN_LIMIT),
        )
        .await?;

        self.remember(cache, key, &logs, None).await;
        Ok(Fetched { data: logs, source: Provenance::Live })
    }

    pub async fn biometric_data(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
        window: LookbackWindow,
    ) -> Result<BiometricReport> {
        let store = &self.store;
        self.read_through(
            EntityKind::Biometrics,
            subject,
            cache,
            window,
            |range| async move { store.biometric_readings(subject, &range).await },
            summary::biometric_summary,
        )
        .await
    }

    /// The newest [`RECENT_INSIGHTS_LIMIT`] insights, newest first.
    pub async fn recent_insights(
        &self,
        subject: Uuid,
        cache: Option<&ContextCache>,
    ) -> Result<Fetched<Vec<AiInsight>>> {
        let key = CacheKey::new(EntityKind::Insights, subject, None);
        if let Some((data, _)) = self.cached(cache, &key, self.settings.fetch_ttl).await {
            return Ok(Fetched { data, source: Provenance::Cache });
        }

        let insights = bounded(
            "insights",
            self.settings.upstream_timeout,
            self.store.recent_insights(subject, RECENT_INSIGHTS_LIMIT),
        )
        .await?;

        self.remember(cache, key, &insights, None).await;
        Ok(Fetched { data: insights, source: Provenance::Live })
    }
}
