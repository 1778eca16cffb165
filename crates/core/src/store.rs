//! HealthStore trait: the relational store the fetchers read through.
//!
//! Range queries are inclusive at both ends and return rows ascending by
//! timestamp. Implementations: PostgreSQL, in-memory (for testing).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::insight::{AiInsight, NewBiometric, NewInsight};
use crate::profile::{UserProfile, UserSettings};
use crate::records::{
    BiometricReading, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog,
};
use crate::window::TimeRange;

type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait HealthStore: Send + Sync {
    /// The backend name (e.g., "postgres", "memory").
    fn name(&self) -> &str;

    /// Round-trip a trivial query. Used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    async fn user_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    async fn user_settings(&self, user_id: Uuid) -> StoreResult<Option<UserSettings>>;

    async fn glucose_readings(&self, user_id: Uuid, range: &TimeRange)
        -> StoreResult<Vec<GlucoseReading>>;

    async fn food_logs(&self, user_id: Uuid, range: &TimeRange) -> StoreResult<Vec<FoodLog>>;

    async fn medication_logs(&self, user_id: Uuid, range: &TimeRange)
        -> StoreResult<Vec<MedicationLog>>;

    async fn exercise_logs(&self, user_id: Uuid, range: &TimeRange)
        -> StoreResult<Vec<ExerciseLog>>;

    async fn insulin_logs(&self, user_id: Uuid, range: &TimeRange) -> StoreResult<Vec<InsulinLog>>;

    /// Newest first, at most `limit` rows, regardless of age.
    async fn recent_insulin_logs(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<InsulinLog>>;

    async fn biometric_readings(&self, user_id: Uuid, range: &TimeRange)
        -> StoreResult<Vec<BiometricReading>>;

    /// Newest first, at most `limit` rows.
    async fn recent_insights(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<AiInsight>>;

    async fn find_insight_type(&self, name: &str) -> StoreResult<Option<i32>>;

    async fn create_insight_type(&self, name: &str, description: &str) -> StoreResult<i32>;

    async fn insert_insight(&self, insight: NewInsight) -> StoreResult<Uuid>;

    async fn find_biometric_type(&self, name: &str) -> StoreResult<Option<i32>>;

    async fn create_biometric_type(&self, name: &str) -> StoreResult<i32>;

    async fn insert_biometric(&self, reading: NewBiometric) -> StoreResult<Uuid>;
}
