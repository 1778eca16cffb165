//! Capability table: profile-gated fetches the aggregator may perform.
//!
//! Each row names a capability and the profile predicate that enables it.
//! Adding a gated data source means adding a row here and a slot in the
//! snapshot.

use serde::{Deserialize, Serialize};

use debie_core::profile::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Insulin intake logs over the window.
    InsulinRecords,
    /// Yesterday's activity, heart-rate and sleep from the tracker.
    FitnessTracker,
}

pub struct CapabilityGate {
    pub capability: Capability,
    pub gate: &'static str,
    enabled: fn(&UserProfile) -> bool,
}

impl CapabilityGate {
    pub fn is_enabled(&self, profile: &UserProfile) -> bool {
        (self.enabled)(profile)
    }
}

fn fitbit_activated(profile: &UserProfile) -> bool {
    profile.is_fitbit_activated
}

pub const CAPABILITIES: &[CapabilityGate] = &[
    CapabilityGate {
        capability: Capability::InsulinRecords,
        gate: "diabetes_type is insulin-dependent",
        enabled: UserProfile::is_insulin_dependent,
    },
    CapabilityGate {
        capability: Capability::FitnessTracker,
        gate: "is_fitbit_activated",
        enabled: fitbit_activated,
    },
];

/// Capabilities the profile enables, in table order.
pub fn enabled_for(profile: &UserProfile) -> Vec<Capability> {
    CAPABILITIES
        .iter()
        .filter(|row| row.is_enabled(profile))
        .map(|row| row.capability)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use debie_core::profile::DiabetesType;
    use uuid::Uuid;

    #[test]
    fn plain_profile_enables_nothing() {
        assert!(enabled_for(&UserProfile::new(Uuid::nil())).is_empty());
    }

    #[test]
    fn type_one_enables_insulin() {
        let mut profile = UserProfile::new(Uuid::nil());
        profile.diabetes_type = Some(DiabetesType::Type1);
        assert_eq!(enabled_for(&profile), vec![Capability::InsulinRecords]);
    }

    #[test]
    fn type_two_with_tracker() {
        let mut profile = UserProfile::new(Uuid::nil());
        profile.diabetes_type = Some(DiabetesType::Type2);
        profile.is_fitbit_activated = true;
        assert_eq!(enabled_for(&profile), vec![Capability::FitnessTracker]);
    }

    #[test]
    fn every_capability_has_one_row() {
        for cap in [Capability::InsulinRecords, Capability::FitnessTracker] {
            assert_eq!(CAPABILITIES.iter().filter(|r| r.capability == cap).count(), 1);
        }
    }
}
