//! Tool trait: the surface an LLM agent calls to read and write health data.
//!
//! Each tool advertises a JSON Schema for its arguments and returns a
//! [`ToolResult`]. Malformed arguments are a [`ToolError`]; upstream
//! failures are a successful call carrying `success: false` and the
//! structured error payload, so the agent can still reason about them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FetchError, ToolError};

/// A tool definition handed to the agent runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id chosen by the caller, echoed back on the result
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,

    pub success: bool,

    /// Human-readable rendering of `data`
    pub output: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// Successful result with `data` pretty-printed into `output`.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: serde_json::to_string_pretty(&data).unwrap_or_default(),
            data: Some(data),
        }
    }

    /// Upstream failure reported in-band.
    pub fn failure(error: &FetchError) -> Self {
        Self {
            call_id: String::new(),
            success: false,
            output: error.to_string(),
            data: Some(error.to_payload()),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "get_glucose_readings").
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> serde_json::Value;

    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Name-indexed set of tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool call and stamp the result with the call id.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let mut result = tool.execute(call.arguments.clone()).await?;
        result.call_id = call.id.clone();
        Ok(result)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the `user_id` it was given, or fails upstream on request.
    struct LookupTool;

    #[async_trait]
    impl Tool for LookupTool {
        fn name(&self) -> &str { "lookup" }
        fn description(&self) -> &str { "Echoes the user id" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": { "type": "string" },
                    "fail": { "type": "boolean" }
                },
                "required": ["user_id"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let user_id = arguments["user_id"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'user_id' argument".into()))?;
            if arguments["fail"].as_bool().unwrap_or(false) {
                return Ok(ToolResult::failure(&FetchError::UpstreamUnavailable("db down".into())));
            }
            Ok(ToolResult::ok(serde_json::json!({ "user_id": user_id })))
        }
    }

    fn call(arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "lookup".into(),
            arguments,
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool));
        assert!(registry.get("lookup").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.names(), vec!["lookup"]);
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "lookup");
        assert_eq!(defs[0].parameters["required"][0], "user_id");
    }

    #[tokio::test]
    async fn execute_stamps_call_id() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool));

        let result = registry.execute(&call(serde_json::json!({"user_id": "u1"}))).await.unwrap();
        assert!(result.success);
        assert_eq!(result.call_id, "call_1");
        assert_eq!(result.data.unwrap()["user_id"], "u1");
    }

    #[tokio::test]
    async fn upstream_failure_is_in_band() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool));

        let result = registry
            .execute(&call(serde_json::json!({"user_id": "u1", "fail": true})))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.data.unwrap()["kind"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn missing_argument_is_an_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(LookupTool));

        let err = registry.execute(&call(serde_json::json!({}))).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "call_1".into(),
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
