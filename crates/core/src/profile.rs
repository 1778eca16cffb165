//! Subject profile and per-user settings rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clinical diabetes classification recorded on the profile.
///
/// Parsed leniently: `"1"`, `"Type 1"`, `"type_1"` and `"T1D"` all mean
/// [`DiabetesType::Type1`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiabetesType {
    Type1,
    Type2,
    Gestational,
    Prediabetes,
    Other(String),
}

impl DiabetesType {
    /// Whether management normally involves logged insulin doses.
    pub fn is_insulin_dependent(&self) -> bool {
        matches!(self, Self::Type1)
    }
}

impl From<String> for DiabetesType {
    fn from(raw: String) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "1" | "type1" | "t1" | "t1d" => Self::Type1,
            "2" | "type2" | "t2" | "t2d" => Self::Type2,
            "gestational" | "gdm" => Self::Gestational,
            "prediabetes" => Self::Prediabetes,
            _ => Self::Other(raw),
        }
    }
}

impl From<DiabetesType> for String {
    fn from(kind: DiabetesType) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for DiabetesType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type1 => f.write_str("Type 1"),
            Self::Type2 => f.write_str("Type 2"),
            Self::Gestational => f.write_str("Gestational"),
            Self::Prediabetes => f.write_str("Prediabetes"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// The `users` row, minus integration secrets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// `metric` or `imperial`
    #[serde(default = "default_unit_preference")]
    pub unit_preference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diabetes_type: Option<DiabetesType>,

    #[serde(default)]
    pub is_cgm_activated: bool,

    #[serde(default)]
    pub is_fitbit_activated: bool,
}

fn default_unit_preference() -> String {
    "metric".into()
}

impl UserProfile {
    /// A profile with only the identifier set.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            username: None,
            email: None,
            date_of_birth: None,
            gender: None,
            weight: None,
            height: None,
            unit_preference: default_unit_preference(),
            diabetes_type: None,
            is_cgm_activated: false,
            is_fitbit_activated: false,
        }
    }

    pub fn is_insulin_dependent(&self) -> bool {
        self.diabetes_type
            .as_ref()
            .is_some_and(DiabetesType::is_insulin_dependent)
    }
}

/// The `user_settings` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,

    #[serde(default = "default_true")]
    pub food_log_reminder_enabled: bool,

    #[serde(default = "default_reminder_frequency")]
    pub food_log_reminder_frequency_hours: i32,

    #[serde(default = "default_true")]
    pub medication_reminder_enabled: bool,

    #[serde(default = "default_true")]
    pub insulin_reminder_enabled: bool,

    #[serde(default = "default_delivery_method")]
    pub notification_delivery_method: String,
}

fn default_true() -> bool {
    true
}
fn default_reminder_frequency() -> i32 {
    4
}
fn default_delivery_method() -> String {
    "in_app".into()
}

impl UserSettings {
    /// Settings with every column at its schema default.
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            food_log_reminder_enabled: true,
            food_log_reminder_frequency_hours: default_reminder_frequency(),
            medication_reminder_enabled: true,
            insulin_reminder_enabled: true,
            notification_delivery_method: default_delivery_method(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diabetes_type_parses_loosely() {
        assert_eq!(DiabetesType::from("1".to_string()), DiabetesType::Type1);
        assert_eq!(DiabetesType::from("Type 1".to_string()), DiabetesType::Type1);
        assert_eq!(DiabetesType::from("type_2".to_string()), DiabetesType::Type2);
        assert_eq!(
            DiabetesType::from("MODY".to_string()),
            DiabetesType::Other("MODY".into())
        );
    }

    #[test]
    fn only_type_one_is_insulin_dependent() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        assert!(!profile.is_insulin_dependent());

        profile.diabetes_type = Some(DiabetesType::Type2);
        assert!(!profile.is_insulin_dependent());

        profile.diabetes_type = Some(DiabetesType::Type1);
        assert!(profile.is_insulin_dependent());
    }

    #[test]
    fn profile_serialization_roundtrip() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.username = Some("sam".into());
        profile.diabetes_type = Some(DiabetesType::Type1);
        profile.weight = Some(70.5);

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["diabetes_type"], "Type 1");
        assert!(json.get("email").is_none());

        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn settings_defaults_match_schema() {
        let settings: UserSettings =
            serde_json::from_value(serde_json::json!({ "user_id": Uuid::nil() })).unwrap();
        assert!(settings.food_log_reminder_enabled);
        assert_eq!(settings.food_log_reminder_frequency_hours, 4);
        assert_eq!(settings.notification_delivery_method, "in_app");
        assert_eq!(settings, UserSettings::defaults_for(Uuid::nil()));
    }
}
