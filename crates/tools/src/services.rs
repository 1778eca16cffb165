//! The shared handle every agent tool holds.

use std::sync::Arc;

use debie_core::integration::{CalendarService, FitnessTracker};

use crate::cache::ContextCache;
use crate::context::ContextAggregator;
use crate::enrich::QueryEnricher;
use crate::fetch::DataFetcher;
use crate::writers::{BiometricWriter, InsightWriter};

/// Fetchers, the process-wide context cache, and the optional third-party
/// integrations, wired once at startup.
pub struct HealthServices {
    pub fetcher: DataFetcher,
    pub cache: ContextCache,
    pub aggregator: ContextAggregator,
    pub enricher: QueryEnricher,
    pub insights: InsightWriter,
    pub biometrics: BiometricWriter,
    pub calendar: Option<Arc<dyn CalendarService>>,
}

impl HealthServices {
    pub fn new(fetcher: DataFetcher) -> Self {
        Self {
            cache: ContextCache::with_capacity(fetcher.settings().cache_capacity),
            aggregator: ContextAggregator::new(fetcher.clone()),
            enricher: QueryEnricher::new(fetcher.clone()),
            insights: InsightWriter::new(fetcher.clone()),
            biometrics: BiometricWriter::new(fetcher.clone()),
            calendar: None,
            fetcher,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn FitnessTracker>) -> Self {
        self.aggregator = self.aggregator.with_tracker(tracker);
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarService>) -> Self {
        self.aggregator = self.aggregator.with_calendar(calendar.clone());
        self.calendar = Some(calendar);
        self
    }

    pub fn cache(&self) -> Option<&ContextCache> {
        Some(&self.cache)
    }
}
