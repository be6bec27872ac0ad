//! Observation type identifiers retained from the health exports.
//!
//! Point observations from `export.xml` and `export_cda.xml` are kept only
//! when their type appears in [`TARGET_TYPES`]. Workouts and ECG sessions are
//! accepted outside the allow-list.

use std::fmt;

/// Pseudo-type assigned to records derived from ECG session files.
pub const ECG_TYPE: &str = "ECG";

/// Broad grouping of the allow-listed observation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeCategory {
    Activity,
    Heart,
    Sleep,
    BodyMetrics,
    PerformanceRecovery,
    SedentaryMonitor,
}

impl TypeCategory {
    pub fn label(self) -> &'static str {
        match self {
            TypeCategory::Activity => "Activity",
            TypeCategory::Heart => "Heart",
            TypeCategory::Sleep => "Sleep",
            TypeCategory::BodyMetrics => "Body Metrics",
            TypeCategory::PerformanceRecovery => "Performance & Recovery",
            TypeCategory::SedentaryMonitor => "Sedentary Monitor",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An allow-listed observation type and its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetType {
    pub identifier: &'static str,
    pub category: TypeCategory,
}

const fn target(identifier: &'static str, category: TypeCategory) -> TargetType {
    TargetType {
        identifier,
        category,
    }
}

/// Observation types retained from the XML exports.
pub const TARGET_TYPES: &[TargetType] = &[
    target("HKQuantityTypeIdentifierStepCount", TypeCategory::Activity),
    target("HKQuantityTypeIdentifierActiveEnergyBurned", TypeCategory::Activity),
    target("HKQuantityTypeIdentifierHeartRate", TypeCategory::Heart),
    target("HKQuantityTypeIdentifierRestingHeartRate", TypeCategory::Heart),
    target("HKQuantityTypeIdentifierHeartRateVariabilitySDNN", TypeCategory::Heart),
    target("HKCategoryTypeIdentifierSleepAnalysis", TypeCategory::Sleep),
    target("HKQuantityTypeIdentifierBodyMass", TypeCategory::BodyMetrics),
    target("HKQuantityTypeIdentifierBodyFatPercentage", TypeCategory::BodyMetrics),
    target("HKQuantityTypeIdentifierVO2Max", TypeCategory::PerformanceRecovery),
    target("HKQuantityTypeIdentifierRespiratoryRate", TypeCategory::PerformanceRecovery),
    target("HKCategoryTypeIdentifierAppleStandHour", TypeCategory::SedentaryMonitor),
];

/// Returns true if `identifier` is an allow-listed observation type.
pub fn is_target_type(identifier: &str) -> bool {
    TARGET_TYPES.iter().any(|t| t.identifier == identifier)
}

/// Looks up the allow-list entry for `identifier`.
pub fn target_type(identifier: &str) -> Option<&'static TargetType> {
    TARGET_TYPES.iter().find(|t| t.identifier == identifier)
}

/// Allow-listed identifiers sorted alphabetically.
pub fn sorted_target_identifiers() -> Vec<&'static str> {
    let mut identifiers: Vec<&'static str> = TARGET_TYPES.iter().map(|t| t.identifier).collect();
    identifiers.sort_unstable();
    identifiers
}
