//! AI insights, write payloads, and derived notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recorded on every insight the tools write.
pub const MODEL_VERSION: &str = "debie-agent-1.0";

/// A stored `ai_insights` row joined with its type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInsight {
    pub insight_id: Uuid,
    pub user_id: Uuid,
    pub insight_type: String,
    pub generated_timestamp: DateTime<Utc>,
    pub insight_details: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_data_points: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// Insert payload for `ai_insights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInsight {
    pub user_id: Uuid,
    pub insight_type_id: i32,
    pub generated_timestamp: DateTime<Utc>,
    pub insight_details: serde_json::Value,
    pub model_version: String,
}

/// Insert payload for `biometric_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBiometric {
    pub user_id: Uuid,
    pub biometric_type_id: i32,
    pub reading_timestamp: DateTime<Utc>,
    pub value: f64,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

/// A reminder derived from the subject's settings. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
}
