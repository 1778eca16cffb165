//! Read tools over the per-domain fetchers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use debie_core::error::ToolError;
use debie_core::tool::{Tool, ToolResult};
use debie_core::window::LookbackWindow;

use crate::args::{days_schema, parse, respond, user_id_schema};
use crate::services::HealthServices;

#[derive(Deserialize)]
struct SubjectArgs {
    user_id: Uuid,
}

#[derive(Deserialize)]
struct WindowArgs {
    user_id: Uuid,
    #[serde(default)]
    days: LookbackWindow,
}

pub struct UserInfoTool {
    services: Arc<HealthServices>,
}

impl UserInfoTool {
    pub fn new(services: Arc<HealthServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Tool for UserInfoTool {
    fn name(&self) -> &str {
        "get_user_info"
    }

    fn description(&self) -> &str {
        "Retrieve the user's profile: name, diabetes type, body measurements, unit \
         preference and which devices (CGM, Fitbit) are connected."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "user_id": user_id_schema() },
            "required": ["user_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: SubjectArgs = parse(arguments)?;
        let s = &self.services;
        respond(self.name(), s.fetcher.user_profile(args.user_id, s.cache()).await)
    }
}

/// Which record category a [`DomainTool`] serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthDomain {
    Glucose,
    Food,
    Medication,
    Exercise,
    Biometrics,
}

impl HealthDomain {
    pub const ALL: [HealthDomain; 5] = [
        Self::Glucose,
        Self::Food,
        Self::Medication,
        Self::Exercise,
        Self::Biometrics,
    ];
}

/// Windowed records plus their summary for one [`HealthDomain`].
pub struct DomainTool {
    domain: HealthDomain,
    services: Arc<HealthServices>,
}

impl DomainTool {
    pub fn new(domain: HealthDomain, services: Arc<HealthServices>) -> Self {
        Self { domain, services }
    }
}

#[async_trait]
impl Tool for DomainTool {
    fn name(&self) -> &str {
        match self.domain {
            HealthDomain::Glucose => "get_glucose_readings",
            HealthDomain::Food => "get_food_logs",
            HealthDomain::Medication => "get_medication_logs",
            HealthDomain::Exercise => "get_exercise_logs",
            HealthDomain::Biometrics => "get_biometric_data",
        }
    }

    fn description(&self) -> &str {
        match self.domain {
            HealthDomain::Glucose => {
                "Blood glucose readings for the last N days with average, highest and lowest values (mg/dL)."
            }
            HealthDomain::Food => {
                "Food logs for the last N days with total and daily-average carbs and calories."
            }
            HealthDomain::Medication => {
                "Medication logs for the last N days with dose and distinct-medication counts."
            }
            HealthDomain::Exercise => {
                "Exercise logs for the last N days with total and daily-average duration and calories burned."
            }
            HealthDomain::Biometrics => {
                "Biometric readings (steps, heart rate, weight, blood pressure...) for the last N days, grouped by type."
            }
        }
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema(),
                "days": days_schema()
            },
            "required": ["user_id"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let WindowArgs { user_id, days } = parse(arguments)?;
        let f = &self.services.fetcher;
        let cache = self.services.cache();
        let name = self.name();
        match self.domain {
            HealthDomain::Glucose => respond(name, f.glucose_readings(user_id, cache, days).await),
            HealthDomain::Food => respond(name, f.food_logs(user_id, cache, days).await),
            HealthDomain::Medication => respond(name, f.medication_logs(user_id, cache, days).await),
            HealthDomain::Exercise => respond(name, f.exercise_logs(user_id, cache, days).await),
            HealthDomain::Biometrics => respond(name, f.biometric_data(user_id, cache, days).await),
        }
    }
}
