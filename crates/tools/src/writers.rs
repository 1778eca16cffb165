//! Write paths: AI insights and manual biometric readings.
//!
//! Both resolve a lookup-table id by name, creating the row when it is
//! missing, then insert. The two writes are independent statements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use debie_core::error::{FetchError, Result};
use debie_core::insight::{MODEL_VERSION, NewBiometric, NewInsight};

use crate::fetch::{DataFetcher, bounded};

pub const DEFAULT_BIOMETRIC_SOURCE: &str = "Manual";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInsight {
    pub insight_id: Uuid,
    pub insight_type_id: i32,
    pub insight_type: String,
    pub generated_timestamp: DateTime<Utc>,
    pub model_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBiometric {
    pub id: Uuid,
    pub biometric_type_id: i32,
    pub biometric_type: String,
    pub reading_timestamp: DateTime<Utc>,
    pub value: f64,
    pub source: String,
}

/// A biometric sample to record. Blood-pressure fields are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricInput {
    pub biometric_type: String,
    pub value: f64,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub systolic_bp: Option<f64>,
    #[serde(default)]
    pub diastolic_bp: Option<f64>,
}

fn default_source() -> String {
    DEFAULT_BIOMETRIC_SOURCE.to_string()
}

fn require_name(what: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(FetchError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(())
}

pub struct InsightWriter {
    fetcher: DataFetcher,
}

impl InsightWriter {
    pub fn new(fetcher: DataFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn save_insight(
        &self,
        subject: Uuid,
        insight_type: &str,
        content: serde_json::Value,
    ) -> Result<SavedInsight> {
        require_name("insight_type", insight_type)?;
        let store = self.fetcher.store();
        let limit = self.fetcher.settings().upstream_timeout;

        let insight_type_id = match bounded("insight type lookup", limit, store.find_insight_type(insight_type)).await? {
            Some(id) => id,
            None => {
                let description = format!("AI-generated insights about {insight_type}");
                let id = bounded("insight type insert", limit, store.create_insight_type(insight_type, &description)).await?;
                info!(insight_type, id, "Created insight type");
                id
            }
        };

        let generated_timestamp = self.fetcher.clock().now();
        let insight = NewInsight {
            user_id: subject,
            insight_type_id,
            generated_timestamp,
            insight_details: content,
            model_version: MODEL_VERSION.to_string(),
        };
        let insight_id = bounded("insight insert", limit, store.insert_insight(insight)).await?;
        info!(%subject, insight_type, %insight_id, "Insight saved");

        Ok(SavedInsight {
            insight_id,
            insight_type_id,
            insight_type: insight_type.to_string(),
            generated_timestamp,
            model_version: MODEL_VERSION.to_string(),
        })
    }
}

pub struct BiometricWriter {
    fetcher: DataFetcher,
}

impl BiometricWriter {
    pub fn new(fetcher: DataFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn save_biometric(&self, subject: Uuid, input: BiometricInput) -> Result<SavedBiometric> {
        require_name("biometric_type", &input.biometric_type)?;
        if !input.value.is_finite() {
            return Err(FetchError::InvalidInput(format!(
                "biometric value must be a finite number, got {}",
                input.value
            )));
        }
        let store = self.fetcher.store();
        let limit = self.fetcher.settings().upstream_timeout;
        let name = input.biometric_type.as_str();

        let biometric_type_id = match bounded("biometric type lookup", limit, store.find_biometric_type(name)).await? {
            Some(id) => id,
            None => bounded("biometric type insert", limit, store.create_biometric_type(name)).await?,
        };

        let reading_timestamp = self.fetcher.clock().now();
        let reading = NewBiometric {
            user_id: subject,
            biometric_type_id,
            reading_timestamp,
            value: input.value,
            systolic_bp: input.systolic_bp,
            diastolic_bp: input.diastolic_bp,
            source: input.source.clone(),
        };
        let id = bounded("biometric insert", limit, store.insert_biometric(reading)).await?;
        info!(%subject, biometric_type = name, "Biometric reading saved");

        Ok(SavedBiometric {
            id,
            biometric_type_id,
            biometric_type: input.biometric_type,
            reading_timestamp,
            value: input.value,
            source: input.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use debie_core::error::ErrorKind;
    use debie_core::store::HealthStore;
    use debie_core::window::LookbackWindow;
    use serde_json::json;

    #[tokio::test]
    async fn insight_type_created_once() {
        let fx = Fixture::new().await;
        let writer = InsightWriter::new(fx.fetcher.clone());

        let first = writer
            .save_insight(fx.user, "glucose_pattern", json!({"summary": "stable mornings"}))
            .await
            .unwrap();
        let second = writer
            .save_insight(fx.user, "glucose_pattern", json!({"summary": "evening spikes"}))
            .await
            .unwrap();

        assert_eq!(first.insight_type_id, second.insight_type_id);
        assert_ne!(first.insight_id, second.insight_id);
        assert_eq!(first.model_version, "debie-agent-1.0");

        let recent = fx.fetcher.recent_insights(fx.user, None).await.unwrap().data;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].insight_type, "glucose_pattern");
    }

    #[tokio::test]
    async fn empty_insight_type_rejected() {
        let fx = Fixture::new().await;
        let writer = InsightWriter::new(fx.fetcher.clone());
        let err = writer.save_insight(fx.user, "  ", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn insert_failure_surfaces_as_upstream() {
        let fx = Fixture::new().await;
        fx.store.fail("insert_insight").await;
        let writer = InsightWriter::new(fx.fetcher.clone());
        let err = writer.save_insight(fx.user, "trend", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        // The type row was written before the failing insert.
        assert!(fx.store.find_insight_type("trend").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn blood_pressure_reading_round_trips() {
        let fx = Fixture::new().await;
        let writer = BiometricWriter::new(fx.fetcher.clone());
        let saved = writer
            .save_biometric(
                fx.user,
                BiometricInput {
                    biometric_type: "Blood Pressure".into(),
                    value: 120.0,
                    source: DEFAULT_BIOMETRIC_SOURCE.into(),
                    systolic_bp: Some(120.0),
                    diastolic_bp: Some(80.0),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.source, "Manual");

        let report = fx
            .fetcher
            .biometric_data(fx.user, None, LookbackWindow::default())
            .await
            .unwrap();
        let bp = &report.summary.by_type["blood_pressure"][0];
        assert_eq!(bp.diastolic_bp, Some(80.0));
        assert_eq!(bp.id, saved.id);
    }

    #[test]
    fn source_defaults_to_manual() {
        let input: BiometricInput =
            serde_json::from_value(json!({"biometric_type": "Steps", "value": 4200})).unwrap();
        assert_eq!(input.source, "Manual");
        assert!(input.systolic_bp.is_none());
    }

    #[tokio::test]
    async fn non_finite_value_rejected() {
        let fx = Fixture::new().await;
        let writer = BiometricWriter::new(fx.fetcher.clone());
        let input = BiometricInput {
            biometric_type: "Weight".into(),
            value: f64::NAN,
            source: default_source(),
            systolic_bp: None,
            diastolic_bp: None,
        };
        let err = writer.save_biometric(fx.user, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
