//! Lookback windows and the inclusive time ranges they resolve to.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

use crate::error::FetchError;

/// Default lookback for per-domain fetches and the aggregate.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// A trailing span of whole days. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct LookbackWindow(NonZeroU32);

impl LookbackWindow {
    /// Build a window from an externally supplied day count.
    ///
    /// Zero, negative, and out-of-range values are `InvalidInput`.
    pub fn days(days: i64) -> Result<Self, FetchError> {
        u32::try_from(days)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or_else(|| {
                FetchError::InvalidInput(format!(
                    "lookback window must be a positive number of days, got {days}"
                ))
            })
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Human label used in reports, e.g. `"Last 7 days"`.
    pub fn label(&self) -> String {
        format!("Last {} days", self.0)
    }

    pub fn span(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.get()))
    }

    /// `[now - window, now]`.
    ///
    /// A window reaching past the earliest representable date is
    /// `InvalidInput`.
    pub fn range_ending_at(&self, now: DateTime<Utc>) -> Result<TimeRange, FetchError> {
        let start = now
            .checked_sub_signed(self.span())
            .ok_or_else(|| self.out_of_range())?;
        Ok(TimeRange { start, end: now })
    }

    /// `[now, now + window]`, for look-ahead queries such as calendar events.
    pub fn range_starting_at(&self, now: DateTime<Utc>) -> Result<TimeRange, FetchError> {
        let end = now
            .checked_add_signed(self.span())
            .ok_or_else(|| self.out_of_range())?;
        Ok(TimeRange { start: now, end })
    }

    fn out_of_range(&self) -> FetchError {
        FetchError::InvalidInput(format!(
            "lookback window of {} days is outside the supported date range",
            self.0
        ))
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_WINDOW_DAYS).unwrap_or(NonZeroU32::MIN))
    }
}

impl TryFrom<i64> for LookbackWindow {
    type Error = FetchError;

    fn try_from(days: i64) -> Result<Self, Self::Error> {
        Self::days(days)
    }
}

impl From<LookbackWindow> for u32 {
    fn from(window: LookbackWindow) -> Self {
        window.get()
    }
}

impl std::fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// A closed time interval; both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}
