//! Tools that record insights and biometrics, and surface reminders.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use debie_core::error::ToolError;
use debie_core::tool::{Tool, ToolResult};

use crate::args::{parse, respond, user_id_schema};
use crate::notifications::pending_notifications;
use crate::services::HealthServices;
use crate::writers::BiometricInput;

pub struct SaveInsightTool {
    services: Arc<HealthServices>,
}

impl SaveInsightTool {
    pub fn new(services: Arc<HealthServices>) -> Self {
        Self { services }
    }
}

#[derive(Deserialize)]
struct InsightArgs {
    user_id: Uuid,
    insight_type: String,
    content: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
impl Tool for SaveInsightTool {
    fn name(&self) -> &str {
        "save_insight"
    }

    fn description(&self) -> &str {
        "Persist an insight you generated about the user (e.g. glucose_pattern, \
         food_correlation) so it shows up in later conversations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema(),
                "insight_type": {
                    "type": "string",
                    "description": "Category of the insight, e.g. glucose_pattern"
                },
                "content": {
                    "type": "object",
                    "description": "The insight itself"
                }
            },
            "required": ["user_id", "insight_type", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: InsightArgs = parse(arguments)?;
        let saved = self
            .services
            .insights
            .save_insight(args.user_id, &args.insight_type, serde_json::Value::Object(args.content))
            .await;
        respond(self.name(), saved)
    }
}

pub struct SaveBiometricTool {
    services: Arc<HealthServices>,
}

impl SaveBiometricTool {
    pub fn new(services: Arc<HealthServices>) -> Self {
        Self { services }
    }
}

#[derive(Deserialize)]
struct BiometricArgs {
    user_id: Uuid,
    #[serde(flatten)]
    reading: BiometricInput,
}

#[async_trait]
impl Tool for SaveBiometricTool {
    fn name(&self) -> &str {
        "save_biometric_data"
    }

    fn description(&self) -> &str {
        "Record a biometric reading such as Steps, Heart Rate, Weight or Blood Pressure. \
         For blood pressure pass systolic_bp and diastolic_bp."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema(),
                "biometric_type": { "type": "string" },
                "value": { "type": "number" },
                "source": { "type": "string", "default": "Manual" },
                "systolic_bp": { "type": "number" },
                "diastolic_bp": { "type": "number" }
            },
            "required": ["user_id", "biometric_type", "value"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: BiometricArgs = parse(arguments)?;
        let saved = self.services.biometrics.save_biometric(args.user_id, args.reading).await;
        respond(self.name(), saved)
    }
}

pub struct NotificationsTool {
    services: Arc<HealthServices>,
}

impl NotificationsTool {
    pub fn new(services: Arc<HealthServices>) -> Self {
        Self { services }
    }
}

#[derive(Deserialize)]
struct SubjectArgs {
    user_id: Uuid,
}

#[async_trait]
impl Tool for NotificationsTool {
    fn name(&self) -> &str {
        "get_user_notifications"
    }

    fn description(&self) -> &str {
        "Pending reminders (meal logging, medication, insulin) based on the user's settings."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "user_id": user_id_schema() },
            "required": ["user_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: SubjectArgs = parse(arguments)?;
        let s = &self.services;
        let outcome = pending_notifications(&s.fetcher, args.user_id, s.cache())
            .await
            .map(|notifications| json!({ "count": notifications.len(), "notifications": notifications }));
        respond(self.name(), outcome)
    }
}
