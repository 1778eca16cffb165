//! PostgreSQL store.
//!
//! Implements [`HealthStore`] over `sqlx`. Decimal columns are cast to
//! `float8` in SQL so rows decode into plain `f64`. Lookup names (meal
//! type, medication, exercise type...) are joined in.
//!
//! # Setup
//!
//! Run [`PostgresStore::migrate`] (or `debie migrate`) to apply
//! `migrations/001_create_schema.sql`.
//!
//! # Feature gate
//!
//! This module is behind the `postgres` feature flag (on by default).

use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info};
use uuid::Uuid;

use debie_core::error::StoreError;
use debie_core::insight::{AiInsight, NewBiometric, NewInsight};
use debie_core::profile::{DiabetesType, UserProfile, UserSettings};
use debie_core::records::{
    BiometricReading, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog,
};
use debie_core::store::HealthStore;
use debie_core::window::TimeRange;

/// Connection pool sizing.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 30,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(300),
        }
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a pool for `database_url`.
    ///
    /// The pool connects lazily, so an unreachable database surfaces on
    /// the first query (or [`HealthStore::ping`]) rather than at startup.
    pub fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .max_lifetime(settings.max_lifetime)
            .test_before_acquire(true)
            .connect_lazy(database_url)
            .map_err(|e| StoreError::Connection(format!("PostgreSQL connection failed: {e}")))?;

        info!(max_connections = settings.max_connections, "PostgreSQL pool configured");
        Ok(Self { pool })
    }

    /// Create from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the schema migration.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let migration_sql = include_str!("../migrations/001_create_schema.sql");

        sqlx::raw_sql(migration_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("Migration failed: {e}")))?;

        info!("Health schema migration complete");
        Ok(())
    }

    async fn fetch_range(
        &self,
        sql: &str,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<PgRow>, StoreError> {
        debug!(%user_id, start = %range.start, end = %range.end, "Range query");
        sqlx::query(sql)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)
    }
}

fn query_failed(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(e.to_string())
        }
        other => StoreError::QueryFailed(other.to_string()),
    }
}

fn decode<T>(rows: &[PgRow], f: fn(&PgRow) -> Result<T, sqlx::Error>) -> Result<Vec<T>, StoreError> {
    rows.iter()
        .map(f)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::QueryFailed(format!("Row decode failed: {e}")))
}

fn row_to_profile(row: &PgRow) -> Result<UserProfile, sqlx::Error> {
    Ok(UserProfile {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        date_of_birth: row.try_get("date_of_birth")?,
        gender: row.try_get("gender")?,
        weight: row.try_get("weight")?,
        height: row.try_get("height")?,
        unit_preference: row.try_get("unit_preference")?,
        diabetes_type: row
            .try_get::<Option<String>, _>("diabetes_type")?
            .map(DiabetesType::from),
        is_cgm_activated: row.try_get("is_cgm_activated")?,
        is_fitbit_activated: row.try_get("is_fitbit_activated")?,
    })
}

fn row_to_settings(row: &PgRow) -> Result<UserSettings, sqlx::Error> {
    Ok(UserSettings {
        user_id: row.try_get("user_id")?,
        food_log_reminder_enabled: row.try_get("food_log_reminder_enabled")?,
        food_log_reminder_frequency_hours: row.try_get("food_log_reminder_frequency_hours")?,
        medication_reminder_enabled: row.try_get("medication_reminder_enabled")?,
        insulin_reminder_enabled: row.try_get("insulin_reminder_enabled")?,
        notification_delivery_method: row.try_get("notification_delivery_method")?,
    })
}

fn row_to_glucose(row: &PgRow) -> Result<GlucoseReading, sqlx::Error> {
    Ok(GlucoseReading {
        id: row.try_get("glucose_reading_id")?,
        user_id: row.try_get("user_id")?,
        reading_timestamp: row.try_get("reading_timestamp")?,
        glucose_value: row.try_get("glucose_value")?,
        reading_source: row.try_get("reading_source")?,
    })
}

fn row_to_food(row: &PgRow) -> Result<FoodLog, sqlx::Error> {
    Ok(FoodLog {
        id: row.try_get("food_log_id")?,
        user_id: row.try_get("user_id")?,
        log_timestamp: row.try_get("log_timestamp")?,
        meal_type: row.try_get("meal_type")?,
        food_description: row.try_get("food_description")?,
        quantity: row.try_get("quantity")?,
        unit_of_measure: row.try_get("unit_of_measure")?,
        estimated_carbs: row.try_get("estimated_carbs")?,
        estimated_calories: row.try_get("estimated_calories")?,
    })
}

fn row_to_medication(row: &PgRow) -> Result<MedicationLog, sqlx::Error> {
    Ok(MedicationLog {
        id: row.try_get("medication_log_id")?,
        user_id: row.try_get("user_id")?,
        log_timestamp: row.try_get("log_timestamp")?,
        medication_name: row.try_get("medication_name")?,
        dosage: row.try_get("dosage")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_exercise(row: &PgRow) -> Result<ExerciseLog, sqlx::Error> {
    Ok(ExerciseLog {
        id: row.try_get("exercise_log_id")?,
        user_id: row.try_get("user_id")?,
        log_timestamp: row.try_get("log_timestamp")?,
        exercise_type: row.try_get("exercise_type")?,
        duration_minutes: row.try_get("duration_minutes")?,
        intensity: row.try_get("intensity")?,
        calories_burned: row.try_get("calories_burned")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_insulin(row: &PgRow) -> Result<InsulinLog, sqlx::Error> {
    Ok(InsulinLog {
        id: row.try_get("insulin_log_id")?,
        user_id: row.try_get("user_id")?,
        log_timestamp: row.try_get("log_timestamp")?,
        insulin_type: row.try_get("insulin_type")?,
        dosage_units: row.try_get("dosage_units")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_biometric(row: &PgRow) -> Result<BiometricReading, sqlx::Error> {
    Ok(BiometricReading {
        id: row.try_get("biometric_data_id")?,
        user_id: row.try_get("user_id")?,
        reading_timestamp: row.try_get("reading_timestamp")?,
        biometric_type: row.try_get("biometric_type")?,
        value: row.try_get("value")?,
        systolic_bp: row.try_get("systolic_bp")?,
        diastolic_bp: row.try_get("diastolic_bp")?,
        source: row.try_get("source")?,
    })
}

fn row_to_insight(row: &PgRow) -> Result<AiInsight, sqlx::Error> {
    Ok(AiInsight {
        insight_id: row.try_get("insight_id")?,
        user_id: row.try_get("user_id")?,
        insight_type: row.try_get("insight_type")?,
        generated_timestamp: row.try_get("generated_timestamp")?,
        insight_details: row.try_get("insight_details")?,
        related_data_points: row.try_get("related_data_points")?,
        model_version: row.try_get("model_version")?,
    })
}

const GLUCOSE_SQL: &str = "\
    SELECT glucose_reading_id, user_id, reading_timestamp, \
           glucose_value::float8 AS glucose_value, reading_source \
    FROM glucose_readings \
    WHERE user_id = $1 AND reading_timestamp BETWEEN $2 AND $3 \
    ORDER BY reading_timestamp ASC";

const FOOD_SQL: &str = "\
    SELECT f.food_log_id, f.user_id, f.log_timestamp, mt.type_name AS meal_type, \
           f.food_description, f.quantity::float8 AS quantity, f.unit_of_measure, \
           f.estimated_carbs::float8 AS estimated_carbs, \
           f.estimated_calories::float8 AS estimated_calories \
    FROM food_logs f \
    LEFT JOIN meal_types mt ON mt.meal_type_id = f.meal_type_id \
    WHERE f.user_id = $1 AND f.log_timestamp BETWEEN $2 AND $3 \
    ORDER BY f.log_timestamp ASC";

const MEDICATION_SQL: &str = "\
    SELECT ml.medication_log_id, ml.user_id, ml.log_timestamp, m.medication_name, \
           ml.dosage, ml.notes \
    FROM medications_log ml \
    LEFT JOIN medications m ON m.medication_id = ml.medication_id \
    WHERE ml.user_id = $1 AND ml.log_timestamp BETWEEN $2 AND $3 \
    ORDER BY ml.log_timestamp ASC";

const EXERCISE_SQL: &str = "\
    SELECT e.exercise_log_id, e.user_id, e.log_timestamp, et.type_name AS exercise_type, \
           e.duration_minutes, e.intensity, e.calories_burned::float8 AS calories_burned, e.notes \
    FROM exercise_logs e \
    LEFT JOIN exercise_types et ON et.exercise_type_id = e.exercise_type_id \
    WHERE e.user_id = $1 AND e.log_timestamp BETWEEN $2 AND $3 \
    ORDER BY e.log_timestamp ASC";

const INSULIN_SQL: &str = "\
    SELECT il.insulin_log_id, il.user_id, il.log_timestamp, it.type_name AS insulin_type, \
           il.dosage_units::float8 AS dosage_units, il.notes \
    FROM insulin_intake_log il \
    LEFT JOIN insulin_types it ON it.insulin_type_id = il.insulin_type_id \
    WHERE il.user_id = $1 AND il.log_timestamp BETWEEN $2 AND $3 \
    ORDER BY il.log_timestamp ASC";

const RECENT_INSULIN_SQL: &str = "\
    SELECT il.insulin_log_id, il.user_id, il.log_timestamp, it.type_name AS insulin_type, \
           il.dosage_units::float8 AS dosage_units, il.notes \
    FROM insulin_intake_log il \
    LEFT JOIN insulin_types it ON it.insulin_type_id = il.insulin_type_id \
    WHERE il.user_id = $1 \
    ORDER BY il.log_timestamp DESC \
    LIMIT $2";

const BIOMETRIC_SQL: &str = "\
    SELECT b.biometric_data_id, b.user_id, b.reading_timestamp, bt.type_name AS biometric_type, \
           b.value::float8 AS value, b.systolic_bp::float8 AS systolic_bp, \
           b.diastolic_bp::float8 AS diastolic_bp, b.source \
    FROM biometric_data b \
    JOIN biometric_types bt ON bt.biometric_type_id = b.biometric_type_id \
    WHERE b.user_id = $1 AND b.reading_timestamp BETWEEN $2 AND $3 \
    ORDER BY b.reading_timestamp ASC";

#[async_trait]
impl HealthStore for PostgresStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn user_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query(
            "SELECT user_id, username, email, date_of_birth, gender, \
             weight::float8 AS weight, height::float8 AS height, \
             COALESCE(unit_preference, 'metric') AS unit_preference, diabetes_type, \
             is_cgm_activated, is_fitbit_activated \
             FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref()
            .map(row_to_profile)
            .transpose()
            .map_err(|e| StoreError::QueryFailed(format!("Row decode failed: {e}")))
    }

    async fn user_settings(&self, user_id: Uuid) -> Result<Option<UserSettings>, StoreError> {
        let row = sqlx::query(
            "SELECT user_id, food_log_reminder_enabled, \
             COALESCE(food_log_reminder_frequency_hours, 4) AS food_log_reminder_frequency_hours, \
             medication_reminder_enabled, insulin_reminder_enabled, \
             COALESCE(notification_delivery_method, 'in_app') AS notification_delivery_method \
             FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref()
            .map(row_to_settings)
            .transpose()
            .map_err(|e| StoreError::QueryFailed(format!("Row decode failed: {e}")))
    }

    async fn glucose_readings(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<GlucoseReading>, StoreError> {
        let rows = self.fetch_range(GLUCOSE_SQL, user_id, range).await?;
        decode(&rows, row_to_glucose)
    }

    async fn food_logs(&self, user_id: Uuid, range: &TimeRange) -> Result<Vec<FoodLog>, StoreError> {
        let rows = self.fetch_range(FOOD_SQL, user_id, range).await?;
        decode(&rows, row_to_food)
    }

    async fn medication_logs(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<MedicationLog>, StoreError> {
        let rows = self.fetch_range(MEDICATION_SQL, user_id, range).await?;
        decode(&rows, row_to_medication)
    }

    async fn exercise_logs(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<ExerciseLog>, StoreError> {
        let rows = self.fetch_range(EXERCISE_SQL, user_id, range).await?;
        decode(&rows, row_to_exercise)
    }

    async fn insulin_logs(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<InsulinLog>, StoreError> {
        let rows = self.fetch_range(INSULIN_SQL, user_id, range).await?;
        decode(&rows, row_to_insulin)
    }

    async fn recent_insulin_logs(&self, user_id: Uuid, limit: usize) -> Result<Vec<InsulinLog>, StoreError> {
        let rows = sqlx::query(RECENT_INSULIN_SQL)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        decode(&rows, row_to_insulin)
    }

    async fn biometric_readings(
        &self,
        user_id: Uuid,
        range: &TimeRange,
    ) -> Result<Vec<BiometricReading>, StoreError> {
        let rows = self.fetch_range(BIOMETRIC_SQL, user_id, range).await?;
        decode(&rows, row_to_biometric)
    }

    async fn recent_insights(&self, user_id: Uuid, limit: usize) -> Result<Vec<AiInsight>, StoreError> {
        let rows = sqlx::query(
            "SELECT a.insight_id, a.user_id, it.type_name AS insight_type, \
             a.generated_timestamp, a.insight_details, a.related_data_points, a.model_version \
             FROM ai_insights a \
             JOIN insight_types it ON it.insight_type_id = a.insight_type_id \
             WHERE a.user_id = $1 \
             ORDER BY a.generated_timestamp DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        decode(&rows, row_to_insight)
    }

    async fn find_insight_type(&self, name: &str) -> Result<Option<i32>, StoreError> {
        let row = sqlx::query("SELECT insight_type_id FROM insight_types WHERE type_name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(row.map(|r| r.get("insight_type_id")))
    }

    async fn create_insight_type(&self, name: &str, description: &str) -> Result<i32, StoreError> {
        let row = sqlx::query(
            "INSERT INTO insight_types (type_name, description) VALUES ($1, $2) \
             RETURNING insight_type_id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        debug!(name, "Created insight type");
        Ok(row.get("insight_type_id"))
    }

    async fn insert_insight(&self, insight: NewInsight) -> Result<Uuid, StoreError> {
        let row = sqlx::query(
            "INSERT INTO ai_insights \
             (user_id, insight_type_id, generated_timestamp, insight_details, model_version) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING insight_id",
        )
        .bind(insight.user_id)
        .bind(insight.insight_type_id)
        .bind(insight.generated_timestamp)
        .bind(&insight.insight_details)
        .bind(&insight.model_version)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.get("insight_id"))
    }

    async fn find_biometric_type(&self, name: &str) -> Result<Option<i32>, StoreError> {
        let row = sqlx::query("SELECT biometric_type_id FROM biometric_types WHERE type_name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(row.map(|r| r.get("biometric_type_id")))
    }

    async fn create_biometric_type(&self, name: &str) -> Result<i32, StoreError> {
        let row = sqlx::query(
            "INSERT INTO biometric_types (type_name) VALUES ($1) RETURNING biometric_type_id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        debug!(name, "Created biometric type");
        Ok(row.get("biometric_type_id"))
    }

    async fn insert_biometric(&self, reading: NewBiometric) -> Result<Uuid, StoreError> {
        let row = sqlx::query(
            "INSERT INTO biometric_data \
             (user_id, biometric_type_id, reading_timestamp, value, systolic_bp, diastolic_bp, source) \
             VALUES ($1, $2, $3, $4::float8::numeric, $5::float8::numeric, $6::float8::numeric, $7) \
             RETURNING biometric_data_id",
        )
        .bind(reading.user_id)
        .bind(reading.biometric_type_id)
        .bind(reading.reading_timestamp)
        .bind(reading.value)
        .bind(reading.systolic_bp)
        .bind(reading.diastolic_bp)
        .bind(&reading.source)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.get("biometric_data_id"))
    }
}

// ── Unit tests (no DB required) ──────────────────────────────────────────
