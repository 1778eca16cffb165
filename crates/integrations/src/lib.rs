//! HTTP clients for the optional third-party integrations.
//!
//! - [`FitbitClient`]: Fitbit Web API (daily activity, heart rate, sleep)
//! - [`GoogleCalendarClient`]: Google Calendar v3 events

pub mod calendar;
pub mod fitbit;

pub use calendar::GoogleCalendarClient;
pub use fitbit::FitbitClient;

use debie_core::error::IntegrationError;
use std::time::Duration;

/// Build the shared `reqwest` client with a per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, IntegrationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| IntegrationError::Network(format!("Failed to create HTTP client: {e}")))
}

/// Map a non-2xx response into an [`IntegrationError::ApiError`].
pub(crate) async fn check_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(service, status = status.as_u16(), body = %body, "Integration API error");
    Err(IntegrationError::ApiError {
        status_code: status.as_u16(),
        message: if body.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        },
    })
}
