//! Fitbit Web API client.
//!
//! Reads one day of data from three endpoints:
//! - `/1/user/-/activities/date/{date}.json`
//! - `/1/user/-/activities/heart/date/{date}/1d.json`
//! - `/1.2/user/-/sleep/date/{date}.json`
//!
//! Each endpoint is independent; a failed one leaves its part of the
//! [`FitnessSummary`] empty. Only when all three fail is the call an error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use debie_config::FitbitConfig;
use debie_core::error::IntegrationError;
use debie_core::integration::{
    ActivitySummary, FitnessSummary, FitnessTracker, HeartRateSummary, SleepSummary,
};

const DEFAULT_BASE_URL: &str = "https://api.fitbit.com";

pub struct FitbitClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl FitbitClient {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self, IntegrationError> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            access_token: access_token.into(),
            client: crate::http_client(timeout)?,
        })
    }

    /// Build from `[fitbit]` config. `None` when no token is configured.
    pub fn from_config(
        config: &FitbitConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, IntegrationError> {
        match &config.access_token {
            Some(token) => Ok(Some(Self::new(token.clone(), timeout)?.with_base_url(&config.base_url))),
            None => Ok(None),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, IntegrationError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fitbit request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| IntegrationError::Network(e.to_string()))?;

        crate::check_status("fitbit", response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| IntegrationError::Decode(format!("Failed to parse Fitbit response: {e}")))
    }

    pub async fn activity(&self, date: NaiveDate) -> Result<ActivitySummary, IntegrationError> {
        let resp: ActivityResponse = self
            .get_json(&format!("/1/user/-/activities/date/{date}.json"))
            .await?;
        Ok(resp.into())
    }

    pub async fn heart_rate(&self, date: NaiveDate) -> Result<HeartRateSummary, IntegrationError> {
        let resp: HeartResponse = self
            .get_json(&format!("/1/user/-/activities/heart/date/{date}/1d.json"))
            .await?;
        Ok(resp.into())
    }

    pub async fn sleep(&self, date: NaiveDate) -> Result<SleepSummary, IntegrationError> {
        let resp: SleepResponse = self
            .get_json(&format!("/1.2/user/-/sleep/date/{date}.json"))
            .await?;
        Ok(resp.into())
    }
}

fn keep<T>(part: &str, result: Result<T, IntegrationError>, last: &mut Option<IntegrationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(part, error = %e, "Fitbit endpoint failed");
            *last = Some(e);
            None
        }
    }
}

#[async_trait]
impl FitnessTracker for FitbitClient {
    fn name(&self) -> &str {
        "fitbit"
    }

    async fn daily_summary(&self, date: NaiveDate) -> Result<FitnessSummary, IntegrationError> {
        let mut last_error = None;
        let activity = keep("activity", self.activity(date).await, &mut last_error);
        let heart_rate = keep("heart_rate", self.heart_rate(date).await, &mut last_error);
        let sleep = keep("sleep", self.sleep(date).await, &mut last_error);

        if activity.is_none() && heart_rate.is_none() && sleep.is_none() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(FitnessSummary {
            date,
            activity,
            heart_rate,
            sleep,
        })
    }
}

// --- Wire types ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityTotals {
    #[serde(default)]
    steps: u64,
    #[serde(default)]
    distances: Vec<Distance>,
    #[serde(default)]
    calories_out: u64,
    #[serde(default)]
    fairly_active_minutes: u64,
    #[serde(default)]
    very_active_minutes: u64,
    #[serde(default)]
    sedentary_minutes: u64,
}

#[derive(Debug, Deserialize)]
struct Distance {
    #[serde(default)]
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    #[serde(default)]
    summary: ActivityTotals,
    #[serde(default)]
    activities: Vec<serde_json::Value>,
}

impl From<ActivityResponse> for ActivitySummary {
    fn from(resp: ActivityResponse) -> Self {
        let totals = resp.summary;
        Self {
            steps: totals.steps,
            distance: totals.distances.first().map(|d| d.distance).unwrap_or(0.0),
            calories: totals.calories_out,
            active_minutes: totals.fairly_active_minutes + totals.very_active_minutes,
            sedentary_minutes: totals.sedentary_minutes,
            activities: resp.activities,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartValue {
    #[serde(default)]
    resting_heart_rate: Option<u64>,
    #[serde(default)]
    heart_rate_zones: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HeartDay {
    #[serde(default)]
    value: HeartValue,
}

#[derive(Debug, Default, Deserialize)]
struct Intraday {
    #[serde(default)]
    dataset: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HeartResponse {
    #[serde(rename = "activities-heart", default)]
    days: Vec<HeartDay>,
    #[serde(rename = "activities-heart-intraday", default)]
    intraday: Intraday,
}

impl From<HeartResponse> for HeartRateSummary {
    fn from(resp: HeartResponse) -> Self {
        let value = resp.days.into_iter().next().map(|d| d.value).unwrap_or_default();
        Self {
            resting_heart_rate: value.resting_heart_rate,
            heart_rate_zones: value.heart_rate_zones,
            intraday: resp.intraday.dataset,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SleepTotals {
    #[serde(default)]
    total_minutes_asleep: u64,
    #[serde(default)]
    total_time_in_bed: u64,
    #[serde(default)]
    stages: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SleepResponse {
    #[serde(default)]
    summary: SleepTotals,
    #[serde(default)]
    sleep: Vec<serde_json::Value>,
}

impl From<SleepResponse> for SleepSummary {
    fn from(resp: SleepResponse) -> Self {
        // Efficiency is reported per session; take the main sleep.
        let efficiency = resp
            .sleep
            .iter()
            .find(|s| s["isMainSleep"].as_bool().unwrap_or(false))
            .or_else(|| resp.sleep.first())
            .and_then(|s| s["efficiency"].as_u64());
        Self {
            total_minutes_asleep: resp.summary.total_minutes_asleep,
            total_time_in_bed: resp.summary.total_time_in_bed,
            efficiency,
            stages: resp.summary.stages,
            sessions: resp.sleep,
        }
    }
}
