//! # Debie Core
//!
//! Domain types, traits, and error definitions for the Debie health-context
//! backend. This crate has **no framework dependencies**: it defines the
//! health data model and the seams (store, fitness tracker, calendar, tools)
//! that the other crates implement against.
//!
//! ## Layout
//!
//! - [`records`] / [`profile`] / [`insight`]: rows of the relational model
//! - [`window`]: lookback windows and inclusive time ranges
//! - [`store`]: the upstream structured store
//! - [`integration`]: third-party fitness tracker and calendar
//! - [`tool`]: the agent tool abstraction and registry

pub mod error;
pub mod clock;
pub mod window;
pub mod profile;
pub mod records;
pub mod insight;
pub mod store;
pub mod integration;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ErrorKind, FetchError, IntegrationError, Result, StoreError, ToolError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use window::{LookbackWindow, TimeRange};
pub use profile::{DiabetesType, UserProfile, UserSettings};
pub use records::{
    BiometricReading, Timestamped, ExerciseLog, FoodLog, GlucoseReading, InsulinLog, MedicationLog,
};
pub use insight::{
    AiInsight, MODEL_VERSION, NewBiometric, NewInsight, Notification, NotificationPriority,
};
pub use store::HealthStore;
pub use integration::{
    ActivitySummary, CalendarEvent, CalendarService, EventReminders, EventTime, ExtendedProperties,
    FitnessSummary, FitnessTracker, HeartRateSummary, NewCalendarEvent, ReminderOverride,
    SleepSummary,
};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry, ToolResult};
