//! Domain records: timestamped, subject-owned, immutable observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything with an observation time that range queries filter on.
pub trait Timestamped {
    fn subject(&self) -> Uuid;
    fn timestamp(&self) -> DateTime<Utc>;
}

macro_rules! timestamped {
    ($ty:ty, $field:ident) => {
        impl Timestamped for $ty {
            fn subject(&self) -> Uuid {
                self.user_id
            }
            fn timestamp(&self) -> DateTime<Utc> {
                self.$field
            }
        }
    };
}

/// One blood-glucose measurement in mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reading_timestamp: DateTime<Utc>,
    pub glucose_value: f64,

    /// `CGM`, `meter`, `manual`...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_timestamp: DateTime<Utc>,

    /// Resolved `meal_types.meal_type_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,

    pub food_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_carbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_calories: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_timestamp: DateTime<Utc>,

    /// Resolved `medications.medication_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_timestamp: DateTime<Utc>,

    /// Resolved `exercise_types.exercise_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsulinLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulin_type: Option<String>,

    pub dosage_units: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A generic biometric sample (steps, heart rate, weight, blood pressure...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricReading {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reading_timestamp: DateTime<Utc>,

    /// Resolved `biometric_types.biometric_name`, e.g. `Heart Rate`
    pub biometric_type: String,

    pub value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic_bp: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic_bp: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

timestamped!(GlucoseReading, reading_timestamp);
timestamped!(FoodLog, log_timestamp);
timestamped!(MedicationLog, log_timestamp);
timestamped!(ExerciseLog, log_timestamp);
timestamped!(InsulinLog, log_timestamp);
timestamped!(BiometricReading, reading_timestamp);
