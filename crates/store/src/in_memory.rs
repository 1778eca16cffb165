//! In-memory store: useful for testing and demo deployments.
//!
//! Besides the [`HealthStore`] surface it exposes seeding helpers, a
//! read counter, and per-operation fault injection so callers can exercise
//! cache hits and degraded upstreams without a database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use debie_core::error::StoreError;
use debie_core::insight::{AiInsight, NewBiometric, NewInsight};
use debie_core::profile::{UserProfile, UserSettings};
use debie_core::records::{
    BiometricReading, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog, Timestamped,
};
use debie_core::store::HealthStore;
use debie_core::window::TimeRange;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserProfile>,
    settings: HashMap<Uuid, UserSettings>,
    glucose: Vec<GlucoseReading>,
    food: Vec<FoodLog>,
    medication: Vec<MedicationLog>,
    exercise: Vec<ExerciseLog>,
    insulin: Vec<InsulinLog>,
    biometrics: Vec<BiometricReading>,
    insights: Vec<AiInsight>,
    insight_types: Vec<(i32, String, String)>,
    biometric_types: Vec<(i32, String)>,
}

pub struct InMemoryStore {
    tables: RwLock<Tables>,
    failing: RwLock<HashSet<String>>,
    reads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            failing: RwLock::new(HashSet::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Make `operation` (a trait method name, or `"*"` for all) fail with a
    /// connection error until [`InMemoryStore::recover`] is called.
    pub async fn fail(&self, operation: &str) {
        self.failing.write().await.insert(operation.to_string());
    }

    pub async fn recover(&self) {
        self.failing.write().await.clear();
    }

    /// Number of read queries served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn put_profile(&self, profile: UserProfile) {
        self.tables.write().await.users.insert(profile.user_id, profile);
    }

    pub async fn put_settings(&self, settings: UserSettings) {
        self.tables.write().await.settings.insert(settings.user_id, settings);
    }

    pub async fn push_glucose(&self, reading: GlucoseReading) {
        self.tables.write().await.glucose.push(reading);
    }

    pub async fn push_food(&self, log: FoodLog) {
        self.tables.write().await.food.push(log);
    }

    pub async fn push_medication(&self, log: MedicationLog) {
        self.tables.write().await.medication.push(log);
    }

    pub async fn push_exercise(&self, log: ExerciseLog) {
        self.tables.write().await.exercise.push(log);
    }

    pub async fn push_insulin(&self, log: InsulinLog) {
        self.tables.write().await.insulin.push(log);
    }

    pub async fn push_biometric(&self, reading: BiometricReading) {
        self.tables.write().await.biometrics.push(reading);
    }

    pub async fn push_insight(&self, insight: AiInsight) {
        self.tables.write().await.insights.push(insight);
    }

    async fn check(&self, operation: &str) -> Result<(), StoreError> {
        let failing = self.failing.read().await;
        if failing.contains("*") || failing.contains(operation) {
            return Err(StoreError::Connection(format!("{operation}: connection refused")));
        }
        Ok(())
    }

    async fn read(&self, operation: &str) -> Result<(), StoreError> {
        self.check(operation).await?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows owned by `user_id` inside `range`, oldest first.
fn in_range<T: Timestamped + Clone>(rows: &[T], user_id: Uuid, range: &TimeRange) -> Vec<T> {
    let mut out: Vec<T> = rows
        .iter()
        .filter(|r| r.subject() == user_id && range.contains(r.timestamp()))
        .cloned()
        .collect();
    out.sort_by_key(|r| r.timestamp());
    out
}

#[async_trait]
impl HealthStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check("ping").await
    }

    async fn user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        self.read("user_profile").await?;
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn user_settings(&self, user_id: Uuid) -> Result<Option<UserSettings>, StoreError> {
        self.read("user_settings").await?;
        Ok(self.tables.read().await.settings.get(&user_id).cloned())
    }

    async fn glucose_readings(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<GlucoseReading>, StoreError> {
        self.read("glucose_readings").await?;
        Ok(in_range(&self.tables.read().await.glucose, user_id, range))
    }

    async fn food_logs(&self, user_id: Uuid, range: &TimeRange) -> Result<Vec<FoodLog>, StoreError> {
        self.read("food_logs").await?;
        Ok(in_range(&self.tables.read().await.food, user_id, range))
    }

    async fn medication_logs(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<MedicationLog>, StoreError> {
        self.read("medication_logs").await?;
        Ok(in_range(&self.tables.read().await.medication, user_id, range))
    }

    async fn exercise_logs(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<ExerciseLog>, StoreError> {
        self.read("exercise_logs").await?;
        Ok(in_range(&self.tables.read().await.exercise, user_id, range))
    }

    async fn insulin_logs(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<InsulinLog>, StoreError> {
        self.read("insulin_logs").await?;
        Ok(in_range(&self.tables.read().await.insulin, user_id, range))
    }

    async fn recent_insulin_logs(&self, user_id: Uuid, limit: usize) -> Result<Vec<InsulinLog>, StoreError> {
        self.read("recent_insulin_logs").await?;
        let tables = self.tables.read().await;
        let mut out: Vec<InsulinLog> = tables
            .insulin
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.log_timestamp.cmp(&a.log_timestamp));
        out.truncate(limit);
        Ok(out)
    }

    async fn biometric_readings(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<BiometricReading>, StoreError> {
        self.read("biometric_readings").await?;
        Ok(in_range(&self.tables.read().await.biometrics, user_id, range))
    }

    async fn recent_insights(&self, user_id: Uuid, limit: usize) -> Result<Vec<AiInsight>, StoreError> {
        self.read("recent_insights").await?;
        let tables = self.tables.read().await;
        let mut out: Vec<AiInsight> = tables
            .insights
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.generated_timestamp.cmp(&a.generated_timestamp));
        out.truncate(limit);
        Ok(out)
    }

    async fn find_insight_type(&self, name: &str) -> Result<Option<i32>, StoreError> {
        self.read("find_insight_type").await?;
        let tables = self.tables.read().await;
        Ok(tables
            .insight_types
            .iter()
            .find(|(_, n, _)| n == name)
            .map(|(id, _, _)| *id))
    }

    async fn create_insight_type(&self, name: &str, description: &str) -> Result<i32, StoreError> {
        self.check("create_insight_type").await?;
        let mut tables = self.tables.write().await;
        if tables.insight_types.iter().any(|(_, n, _)| n == name) {
            return Err(StoreError::QueryFailed(format!(
                "duplicate key value violates unique constraint: insight_types.type_name = {name}"
            )));
        }
        let id = tables.insight_types.len() as i32 + 1;
        tables
            .insight_types
            .push((id, name.to_string(), description.to_string()));
        Ok(id)
    }

    async fn insert_insight(&self, insight: NewInsight) -> Result<Uuid, StoreError> {
        self.check("insert_insight").await?;
        let mut tables = self.tables.write().await;
        let insight_type = tables
            .insight_types
            .iter()
            .find(|(id, _, _)| *id == insight.insight_type_id)
            .map(|(_, name, _)| name.clone())
            .ok_or_else(|| {
                StoreError::QueryFailed(format!(
                    "foreign key violation: insight_type_id {}",
                    insight.insight_type_id
                ))
            })?;
        let insight_id = Uuid::new_v4();
        tables.insights.push(AiInsight {
            insight_id,
            user_id: insight.user_id,
            insight_type,
            generated_timestamp: insight.generated_timestamp,
            insight_details: insight.insight_details,
            related_data_points: None,
            model_version: Some(insight.model_version),
        });
        Ok(insight_id)
    }

    async fn find_biometric_type(&self, name: &str) -> Result<Option<i32>, StoreError> {
        self.read("find_biometric_type").await?;
        let tables = self.tables.read().await;
        Ok(tables
            .biometric_types
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| *id))
    }

    async fn create_biometric_type(&self, name: &str) -> Result<i32, StoreError> {
        self.check("create_biometric_type").await?;
        let mut tables = self.tables.write().await;
        if tables.biometric_types.iter().any(|(_, n)| n == name) {
            return Err(StoreError::QueryFailed(format!(
                "duplicate key value violates unique constraint: biometric_types.type_name = {name}"
            )));
        }
        let id = tables.biometric_types.len() as i32 + 1;
        tables.biometric_types.push((id, name.to_string()));
        Ok(id)
    }

    async fn insert_biometric(&self, reading: NewBiometric) -> Result<Uuid, StoreError> {
        self.check("insert_biometric").await?;
        let mut tables = self.tables.write().await;
        let biometric_type = tables
            .biometric_types
            .iter()
            .find(|(id, _)| *id == reading.biometric_type_id)
            .map(|(_, name)| name.clone())
            .ok_or_else(|| {
                StoreError::QueryFailed(format!(
                    "foreign key violation: biometric_type_id {}",
                    reading.biometric_type_id
                ))
            })?;
        let id = Uuid::new_v4();
        tables.biometrics.push(BiometricReading {
            id,
            user_id: reading.user_id,
            reading_timestamp: reading.reading_timestamp,
            biometric_type,
            value: reading.value,
            systolic_bp: reading.systolic_bp,
            diastolic_bp: reading.diastolic_bp,
            source: Some(reading.source),
        });
        Ok(id)
    }
}
