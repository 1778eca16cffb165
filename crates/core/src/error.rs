//! Error types for the Debie domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`FetchError`] is the
//! taxonomy surfaced to callers of the fetchers, the aggregator and the
//! query enricher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Machine-readable classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Store or third-party API unreachable or erroring.
    UpstreamUnavailable,
    /// Subject has no profile row.
    NotFound,
    /// Malformed window parameter or externally supplied argument.
    InvalidInput,
    /// Not even minimal profile data could be assembled.
    ContextUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::ContextUnavailable => "context_unavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured failure from a fetcher, the aggregator or the enricher.
///
/// Failures are reported once and never retried; the caller decides.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Context unavailable: {message}")]
    ContextUnavailable {
        message: String,
        /// The un-enriched query, so the caller can proceed without context.
        original_query: String,
    },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::ContextUnavailable { .. } => ErrorKind::ContextUnavailable,
        }
    }

    /// Render as the `{status, kind, message}` payload returned to agents.
    pub fn to_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "status": "error",
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::ContextUnavailable { original_query, .. } = self {
            payload["original_query"] = serde_json::Value::String(original_query.clone());
        }
        payload
    }
}

impl From<StoreError> for FetchError {
    fn from(e: StoreError) -> Self {
        Self::UpstreamUnavailable(e.to_string())
    }
}

impl From<IntegrationError> for FetchError {
    fn from(e: IntegrationError) -> Self {
        Self::UpstreamUnavailable(e.to_string())
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum IntegrationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Integration not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
