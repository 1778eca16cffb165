//! Per-category summaries over a window of records.
//!
//! All functions are total: an empty slice yields absent statistics or
//! zeroed totals.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use debie_core::records::{
    BiometricReading, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog,
};
use debie_core::window::LookbackWindow;

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn daily_average(total: f64, window: LookbackWindow) -> f64 {
    round2(total / f64::from(window.get()))
}

/// `"Heart Rate"` → `"heart_rate"`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlucoseStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
}

impl GlucoseStatistics {
    pub fn is_empty(&self) -> bool {
        self.average.is_none()
    }
}

pub fn glucose_statistics(readings: &[GlucoseReading], _window: LookbackWindow) -> GlucoseStatistics {
    if readings.is_empty() {
        return GlucoseStatistics::default();
    }
    let values = readings.iter().map(|r| r.glucose_value);
    let sum: f64 = values.clone().sum();
    GlucoseStatistics {
        average: Some(round2(sum / readings.len() as f64)),
        maximum: values.clone().reduce(f64::max),
        minimum: values.reduce(f64::min),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodSummary {
    pub total_carbs: f64,
    pub total_calories: f64,
    pub daily_avg_carbs: f64,
    pub daily_avg_calories: f64,
}

pub fn food_summary(logs: &[FoodLog], window: LookbackWindow) -> FoodSummary {
    let total_carbs: f64 = logs.iter().filter_map(|l| l.estimated_carbs).sum();
    let total_calories: f64 = logs.iter().filter_map(|l| l.estimated_calories).sum();
    FoodSummary {
        total_carbs: round2(total_carbs),
        total_calories: round2(total_calories),
        daily_avg_carbs: daily_average(total_carbs, window),
        daily_avg_calories: daily_average(total_calories, window),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub total_calories: f64,
    pub total_duration: f64,
    pub daily_avg_calories: f64,
    pub daily_avg_duration: f64,
}

pub fn exercise_summary(logs: &[ExerciseLog], window: LookbackWindow) -> ExerciseSummary {
    let total_calories: f64 = logs.iter().filter_map(|l| l.calories_burned).sum();
    let total_duration: f64 = logs
        .iter()
        .filter_map(|l| l.duration_minutes)
        .map(f64::from)
        .sum();
    ExerciseSummary {
        total_calories: round2(total_calories),
        total_duration,
        daily_avg_calories: daily_average(total_calories, window),
        daily_avg_duration: daily_average(total_duration, window),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicationSummary {
    pub total_doses: usize,
    pub distinct_medications: usize,
}

pub fn medication_summary(logs: &[MedicationLog], _window: LookbackWindow) -> MedicationSummary {
    let distinct: BTreeSet<&str> = logs
        .iter()
        .filter_map(|l| l.medication_name.as_deref())
        .collect();
    MedicationSummary {
        total_doses: logs.len(),
        distinct_medications: distinct.len(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsulinSummary {
    pub total_units: f64,
    pub dose_count: usize,
}

pub fn insulin_summary(logs: &[InsulinLog], _window: LookbackWindow) -> InsulinSummary {
    InsulinSummary {
        total_units: round2(logs.iter().map(|l| l.dosage_units).sum()),
        dose_count: logs.len(),
    }
}

/// Biometric readings bucketed by snake-cased type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiometricSummary {
    pub counts: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, Vec<BiometricReading>>,
}

pub fn biometric_summary(readings: &[BiometricReading], _window: LookbackWindow) -> BiometricSummary {
    let mut summary = BiometricSummary::default();
    for reading in readings {
        let key = snake_case(&reading.biometric_type);
        *summary.counts.entry(key.clone()).or_default() += 1;
        summary.by_type.entry(key).or_default().push(reading.clone());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn week() -> LookbackWindow {
        LookbackWindow::default()
    }

    fn glucose(value: f64) -> GlucoseReading {
        GlucoseReading {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            reading_timestamp: Utc::now(),
            glucose_value: value,
            reading_source: None,
        }
    }

    #[test]
    fn glucose_statistics_round_average() {
        let stats = glucose_statistics(&[glucose(100.0), glucose(150.0), glucose(120.0)], week());
        assert_eq!(stats.average, Some(123.33));
        assert_eq!(stats.maximum, Some(150.0));
        assert_eq!(stats.minimum, Some(100.0));
    }

    #[test]
    fn empty_glucose_statistics_are_absent() {
        let stats = glucose_statistics(&[], week());
        assert!(stats.is_empty());
        assert_eq!(serde_json::to_value(&stats).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn food_daily_averages_use_window_days() {
        let log = |carbs: Option<f64>, calories: Option<f64>| FoodLog {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            log_timestamp: Utc::now(),
            meal_type: None,
            food_description: "oats".into(),
            quantity: None,
            unit_of_measure: None,
            estimated_carbs: carbs,
            estimated_calories: calories,
        };
        let summary = food_summary(&[log(Some(45.0), Some(300.0)), log(Some(10.0), None)], week());
        assert_eq!(summary.total_carbs, 55.0);
        assert_eq!(summary.total_calories, 300.0);
        assert_eq!(summary.daily_avg_carbs, 7.86);
        assert_eq!(summary.daily_avg_calories, 42.86);
    }

    #[test]
    fn empty_summaries_are_zero() {
        assert_eq!(food_summary(&[], week()), FoodSummary::default());
        assert_eq!(exercise_summary(&[], week()), ExerciseSummary::default());
        assert_eq!(medication_summary(&[], week()), MedicationSummary::default());
        assert_eq!(insulin_summary(&[], week()), InsulinSummary::default());
        assert!(biometric_summary(&[], week()).counts.is_empty());
    }

    #[test]
    fn exercise_totals() {
        let log = |minutes: i32, calories: f64| ExerciseLog {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            log_timestamp: Utc::now(),
            exercise_type: Some("Walking".into()),
            duration_minutes: Some(minutes),
            intensity: None,
            calories_burned: Some(calories),
            notes: None,
        };
        let summary = exercise_summary(&[log(30, 150.0), log(40, 200.0)], week());
        assert_eq!(summary.total_duration, 70.0);
        assert_eq!(summary.total_calories, 350.0);
        assert_eq!(summary.daily_avg_duration, 10.0);
        assert_eq!(summary.daily_avg_calories, 50.0);
    }

    #[test]
    fn medication_counts_distinct_names() {
        let log = |name: &str| MedicationLog {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            log_timestamp: Utc::now(),
            medication_name: Some(name.into()),
            dosage: Some("500mg".into()),
            notes: None,
        };
        let summary = medication_summary(&[log("Metformin"), log("Metformin"), log("Lisinopril")], week());
        assert_eq!(summary.total_doses, 3);
        assert_eq!(summary.distinct_medications, 2);
    }

    #[test]
    fn biometrics_group_by_snake_case_type() {
        let reading = |kind: &str, value: f64| BiometricReading {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            reading_timestamp: Utc::now(),
            biometric_type: kind.into(),
            value,
            systolic_bp: None,
            diastolic_bp: None,
            source: None,
        };
        let summary = biometric_summary(
            &[reading("Heart Rate", 61.0), reading("Steps", 8000.0), reading("Heart Rate", 70.0)],
            week(),
        );
        assert_eq!(summary.counts["heart_rate"], 2);
        assert_eq!(summary.counts["steps"], 1);
        assert_eq!(summary.by_type["heart_rate"][1].value, 70.0);
    }

    #[test]
    fn snake_case_collapses_separators() {
        assert_eq!(snake_case("Heart Rate"), "heart_rate");
        assert_eq!(snake_case("Blood  Pressure (mmHg)"), "blood_pressure_mmhg");
        assert_eq!(snake_case("Weight"), "weight");
    }

    #[test]
    fn round2_behaviour() {
        assert_eq!(round2(123.3333), 123.33);
        assert_eq!(round2(150.0), 150.0);
        assert_eq!(round2(7.857142), 7.86);
    }
}
