//! Query enrichment: prefix a user query with a compact context block.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use debie_core::error::{FetchError, Result};
use debie_core::profile::UserProfile;
use debie_core::window::LookbackWindow;

use crate::cache::ContextCache;
use crate::fetch::DataFetcher;
use crate::summary::GlucoseStatistics;

/// Glucose trends in the context block cover this many days.
pub const TREND_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedQuery {
    pub original_query: String,
    pub context_summary: String,
    pub enriched_query: String,
    pub user_context: UserProfile,
}

pub struct QueryEnricher {
    fetcher: DataFetcher,
}

impl QueryEnricher {
    pub fn new(fetcher: DataFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn enrich(
        &self,
        subject: Uuid,
        query: &str,
        cache: Option<&ContextCache>,
    ) -> Result<EnrichedQuery> {
        let profile = self
            .fetcher
            .user_profile(subject, cache)
            .await
            .map_err(|e| FetchError::ContextUnavailable {
                message: format!("failed to retrieve user context: {e}"),
                original_query: query.to_string(),
            })?
            .data;

        let uses_insulin = profile.is_insulin_dependent() && self.has_insulin_logs(subject, cache).await;

        let trend_window = LookbackWindow::days(TREND_WINDOW_DAYS)?;
        let glucose = match self.fetcher.glucose_readings(subject, cache, trend_window).await {
            Ok(report) => report.summary,
            Err(e) => {
                warn!(%subject, error = %e, "Glucose trends unavailable for enrichment");
                GlucoseStatistics::default()
            }
        };

        let context_summary = render_context(&profile, uses_insulin, &glucose);
        debug!(%subject, lines = context_summary.lines().count(), "Query enriched");
        Ok(EnrichedQuery {
            original_query: query.to_string(),
            enriched_query: format!("{context_summary}\n\n{query}"),
            context_summary,
            user_context: profile,
        })
    }

    async fn has_insulin_logs(&self, subject: Uuid, cache: Option<&ContextCache>) -> bool {
        match self.fetcher.recent_insulin_logs(subject, cache).await {
            Ok(recent) => !recent.data.is_empty(),
            Err(e) => {
                warn!(%subject, error = %e, "Insulin logs unavailable for enrichment");
                false
            }
        }
    }
}

/// Render the `USER CONTEXT:` block. No trailing newline.
pub fn render_context(profile: &UserProfile, uses_insulin: bool, glucose: &GlucoseStatistics) -> String {
    let mut lines = vec![
        "USER CONTEXT:".to_string(),
        format!("- Name: {}", profile.username.as_deref().unwrap_or("User")),
    ];
    lines.push(match &profile.diabetes_type {
        Some(kind) => format!("- Diabetes Type: {kind}"),
        None => "- Diabetes Type: unspecified".to_string(),
    });
    if let Some(weight) = profile.weight {
        lines.push(format!("- Weight: {weight} {}", profile.unit_preference));
    }
    if let Some(height) = profile.height {
        lines.push(format!("- Height: {height} {}", profile.unit_preference));
    }
    lines.push(format!("- Fitbit Connected: {}", profile.is_fitbit_activated));
    lines.push(format!("- CGM Device Connected: {}", profile.is_cgm_activated));
    if uses_insulin {
        lines.push("- Uses insulin for management".to_string());
    }
    if let (Some(avg), Some(max), Some(min)) = (glucose.average, glucose.maximum, glucose.minimum) {
        lines.push("- Recent glucose trends:".to_string());
        lines.push(format!("  * Average: {avg} mg/dL"));
        lines.push(format!("  * Highest: {max} mg/dL"));
        lines.push(format!("  * Lowest: {min} mg/dL"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use debie_core::error::ErrorKind;
    use chrono::TimeDelta;
    use debie_core::clock::Clock;
    use debie_core::profile::DiabetesType;
    use debie_core::records::InsulinLog;

    #[tokio::test]
    async fn glucose_trends_and_query_suffix() {
        let fx = Fixture::new().await;
        fx.seed_glucose(&[100.0, 150.0, 120.0]).await;
        let enricher = QueryEnricher::new(fx.fetcher.clone());

        let out = enricher.enrich(fx.user, "How am I doing?", None).await.unwrap();
        assert!(out.enriched_query.contains("Average: 123.33"));
        assert!(out.enriched_query.contains("Highest: 150 mg/dL"));
        assert!(out.enriched_query.contains("Lowest: 100 mg/dL"));
        assert!(out.enriched_query.ends_with("\n\nHow am I doing?"));
        assert!(out.enriched_query.starts_with("USER CONTEXT:\n- Name: dana\n- Diabetes Type: Type 2"));
        assert_eq!(out.original_query, "How am I doing?");
    }

    #[tokio::test]
    async fn no_readings_omits_trend_block() {
        let fx = Fixture::new().await;
        let enricher = QueryEnricher::new(fx.fetcher.clone());

        let out = enricher.enrich(fx.user, "Hi", None).await.unwrap();
        assert!(!out.context_summary.contains("Recent glucose trends"));
        assert!(!out.context_summary.contains("Weight"));
        assert!(out.context_summary.ends_with("- CGM Device Connected: false"));
    }

    #[tokio::test]
    async fn missing_profile_is_context_unavailable() {
        let fx = Fixture::new().await;
        let enricher = QueryEnricher::new(fx.fetcher.clone());

        let err = enricher.enrich(Uuid::new_v4(), "What should I eat?", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContextUnavailable);
        match err {
            FetchError::ContextUnavailable { original_query, .. } => {
                assert_eq!(original_query, "What should I eat?");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn insulin_line_needs_type_one_and_logs() {
        let fx = Fixture::new().await;
        fx.seed_insulin(&[5.0]).await;
        let enricher = QueryEnricher::new(fx.fetcher.clone());

        let out = enricher.enrich(fx.user, "q", None).await.unwrap();
        assert!(!out.context_summary.contains("Uses insulin"));

        fx.set_diabetes_type(DiabetesType::Type1).await;
        let out = enricher.enrich(fx.user, "q", None).await.unwrap();
        assert!(out.context_summary.contains("- Uses insulin for management"));
    }

    #[tokio::test]
    async fn old_insulin_logs_still_count() {
        let fx = Fixture::new().await;
        fx.set_diabetes_type(DiabetesType::Type1).await;
        let enricher = QueryEnricher::new(fx.fetcher.clone());

        let out = enricher.enrich(fx.user, "q", None).await.unwrap();
        assert!(!out.context_summary.contains("Uses insulin"));

        fx.store
            .push_insulin(InsulinLog {
                id: Uuid::new_v4(),
                user_id: fx.user,
                log_timestamp: fx.clock.now() - TimeDelta::days(30),
                insulin_type: Some("basal".into()),
                dosage_units: 18.0,
                notes: None,
            })
            .await;
        let out = enricher.enrich(fx.user, "q", None).await.unwrap();
        assert!(out.context_summary.contains("- Uses insulin for management"));
    }

    #[test]
    fn full_block_layout() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.username = Some("sam".into());
        profile.diabetes_type = Some(DiabetesType::Type1);
        let glucose = GlucoseStatistics {
            average: Some(110.0),
            maximum: Some(140.0),
            minimum: Some(90.0),
        };
        assert_eq!(
            render_context(&profile, true, &glucose),
            "USER CONTEXT:\n\
             - Name: sam\n\
             - Diabetes Type: Type 1\n\
             - Fitbit Connected: false\n\
             - CGM Device Connected: false\n\
             - Uses insulin for management\n\
             - Recent glucose trends:\n  \
             * Average: 110 mg/dL\n  \
             * Highest: 140 mg/dL\n  \
             * Lowest: 90 mg/dL"
        );
    }

    #[test]
    fn weight_and_height_use_unit_preference() {
        let mut profile = UserProfile::new(Uuid::new_v4());
        profile.weight = Some(72.5);
        profile.height = Some(180.0);
        let block = render_context(&profile, false, &GlucoseStatistics::default());
        assert!(block.contains("- Name: User"));
        assert!(block.contains("- Diabetes Type: unspecified"));
        assert!(block.contains("- Weight: 72.5 metric"));
        assert!(block.contains("- Height: 180 metric"));
    }
}
