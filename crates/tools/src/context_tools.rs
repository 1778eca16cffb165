//! Tools over the aggregated snapshot and query enrichment.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use debie_core::clock::Clock;
use debie_core::error::ToolError;
use debie_core::tool::{Tool, ToolResult};
use debie_core::window::LookbackWindow;

use crate::args::{days_schema, parse, respond, user_id_schema};
use crate::context::ContextReport;
use crate::services::HealthServices;

pub struct ComprehensiveDataTool {
    services: Arc<HealthServices>,
}

impl ComprehensiveDataTool {
    pub fn new(services: Arc<HealthServices>) -> Self {
        Self { services }
    }
}

#[derive(Deserialize)]
struct SnapshotArgs {
    user_id: Uuid,
    #[serde(default)]
    days: LookbackWindow,
}

#[async_trait]
impl Tool for ComprehensiveDataTool {
    fn name(&self) -> &str {
        "get_comprehensive_user_data"
    }

    fn description(&self) -> &str {
        "Everything known about the user in one call: profile, settings, all health \
         records and statistics for the last N days, Fitbit data, upcoming calendar \
         events and recent insights. Slots that could not be loaded are listed in \
         'unavailable'. Cached for 30 minutes."
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
        let args: SnapshotArgs = parse(arguments)?;
        let s = &self.services;
        let now = s.fetcher.clock().now();
        if let Err(e) = args.days.range_ending_at(now).and_then(|_| args.days.range_starting_at(now)) {
            return respond::<ContextReport>(self.name(), Err(e));
        }
        let report = s.aggregator.snapshot(args.user_id, s.cache(), args.days).await;
        respond(self.name(), Ok(report))
    }
}

pub struct EnrichQueryTool {
    services: Arc<HealthServices>,
}

impl EnrichQueryTool {
    pub fn new(services: Arc<HealthServices>) -> Self {
        Self { services }
    }
}

#[derive(Deserialize)]
struct EnrichArgs {
    user_id: Uuid,
    query: String,
}

#[async_trait]
impl Tool for EnrichQueryTool {
    fn name(&self) -> &str {
        "enrich_with_user_context"
    }

    fn description(&self) -> &str {
        "Prefix the user's question with a short USER CONTEXT block (profile, devices, \
         insulin use, 3-day glucose trends). Call this before answering any question."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_id": user_id_schema(),
                "query": {
                    "type": "string",
                    "description": "The user's original question"
                }
            },
            "required": ["user_id", "query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: EnrichArgs = parse(arguments)?;
        let s = &self.services;
        respond(self.name(), s.enricher.enrich(args.user_id, &args.query, s.cache()).await)
    }
}
