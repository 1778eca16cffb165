//! Argument decoding and result shaping shared by the agent tools.

use serde::Serialize;
use serde::de::DeserializeOwned;

use debie_core::error::{FetchError, ToolError};
use debie_core::tool::ToolResult;

/// Decode a tool's JSON arguments. Any mismatch is `InvalidArguments`.
pub(crate) fn parse<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Turn a fetch outcome into a tool result.
///
/// Upstream and lookup failures stay in-band; rejected input is an
/// argument error.
pub(crate) fn respond<T: Serialize>(
    tool_name: &str,
    outcome: Result<T, FetchError>,
) -> Result<ToolResult, ToolError> {
    match outcome {
        Ok(value) => serde_json::to_value(value)
            .map(ToolResult::ok)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: tool_name.to_string(),
                reason: e.to_string(),
            }),
        Err(FetchError::InvalidInput(message)) => Err(ToolError::InvalidArguments(message)),
        Err(e) => Ok(ToolResult::failure(&e)),
    }
}

pub(crate) fn user_id_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "format": "uuid",
        "description": "The user's id"
    })
}

pub(crate) fn days_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": 1,
        "default": 7,
        "description": "Number of days of data to retrieve"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use debie_core::window::LookbackWindow;
    use serde::Deserialize;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct WindowArgs {
        #[allow(dead_code)]
        user_id: Uuid,
        #[serde(default)]
        days: LookbackWindow,
    }

    #[test]
    fn bad_uuid_is_invalid_arguments() {
        let err = parse::<WindowArgs>(json!({"user_id": "not-a-uuid"})).err().unwrap();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn non_positive_days_rejected() {
        let id = Uuid::new_v4().to_string();
        assert!(parse::<WindowArgs>(json!({"user_id": id, "days": 0})).is_err());
        assert!(parse::<WindowArgs>(json!({"user_id": id, "days": -3})).is_err());
        assert!(parse::<WindowArgs>(json!({"user_id": id, "days": "7"})).is_err());
        let ok = parse::<WindowArgs>(json!({"user_id": id})).unwrap();
        assert_eq!(ok.days.get(), 7);
    }

    #[test]
    fn not_found_stays_in_band() {
        let result = respond::<()>("t", Err(FetchError::NotFound("user".into()))).unwrap();
        assert!(!result.success);
        assert_eq!(result.data.unwrap()["kind"], "not_found");
    }
}
