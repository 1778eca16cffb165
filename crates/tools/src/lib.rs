//! Health context for the Debie agent.
//!
//! A keyed read-through cache in front of the health store, per-domain
//! fetchers with summaries, a capability-gated context aggregator, query
//! enrichment, and the agent tools that expose all of it.

pub mod cache;
pub mod capability;
pub mod context;
pub mod enrich;
pub mod fetch;
pub mod notifications;
pub mod reminders;
pub mod schedule;
pub mod services;
pub mod summary;
pub mod writers;

mod args;
pub mod calendar_tools;
pub mod context_tools;
pub mod health_tools;
pub mod write_tools;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use debie_core::tool::ToolRegistry;

pub use cache::{CacheKey, ContextCache, EntityKind};
pub use context::{ContextAggregator, ContextReport, ContextSnapshot};
pub use enrich::{EnrichedQuery, QueryEnricher};
pub use fetch::{DataFetcher, FetchSettings, Provenance};
pub use services::HealthServices;

/// Registry with every health tool.
///
/// The tools that read or write calendar events are only present when
/// `services` has a calendar.
pub fn default_registry(services: Arc<HealthServices>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(health_tools::UserInfoTool::new(services.clone())));
    for domain in health_tools::HealthDomain::ALL {
        registry.register(Box::new(health_tools::DomainTool::new(domain, services.clone())));
    }
    registry.register(Box::new(context_tools::ComprehensiveDataTool::new(services.clone())));
    registry.register(Box::new(context_tools::EnrichQueryTool::new(services.clone())));
    registry.register(Box::new(write_tools::SaveInsightTool::new(services.clone())));
    registry.register(Box::new(write_tools::SaveBiometricTool::new(services.clone())));
    registry.register(Box::new(write_tools::NotificationsTool::new(services.clone())));
    registry.register(Box::new(calendar_tools::CategorizeEventTool));
    if let Some(calendar) = services.calendar.clone() {
        registry.register(Box::new(calendar_tools::CalendarEventsTool::new(services.clone(), calendar.clone())));
        registry.register(Box::new(calendar_tools::CreateEventTool::new(services.clone(), calendar.clone())));
        registry.register(Box::new(calendar_tools::ScheduleActivityTool::new(services.clone(), calendar.clone())));
        registry.register(Box::new(calendar_tools::LogReminderTool::new(services, calendar)));
    }
    registry
}
