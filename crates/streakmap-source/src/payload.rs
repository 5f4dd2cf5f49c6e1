use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use streakmap_core::{ContributionCounts, CoreError};

/// One day as reported by a provider. The date is kept as the raw string so
/// malformed values fail at conversion, not silently at decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub date: String,
    pub count: u64,
}

/// Provider-neutral shape: daily entries plus per-year totals keyed by year string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContributionPayload {
    pub contributions: Vec<DayEntry>,
    #[serde(default)]
    pub total: BTreeMap<String, u64>,
}

impl ContributionPayload {
    /// Parse the daily entries into typed counts.
    pub fn counts(&self) -> Result<ContributionCounts, CoreError> {
        ContributionCounts::from_entries(
            self.contributions
                .iter()
                .map(|e| (e.date.as_str(), e.count)),
        )
    }
}
