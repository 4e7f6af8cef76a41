use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{BloodGroup, BloodRequest, Donation, Person};

/// Dashboard-level totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationStats {
    pub total_donations: usize,
    pub total_donors: usize,
    pub total_requests: usize,
    pub fulfilled_requests: usize,
    /// Percentage rounded to one decimal; 0 when there are no requests
    pub fulfillment_rate: f64,
}

/// Per-group counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    pub donors: usize,
    pub requests: usize,
    pub donations: usize,
}

/// Counters for every blood group, always holding all eight keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BloodGroupStats {
    pub groups: BTreeMap<BloodGroup, GroupCounts>,
}

impl BloodGroupStats {
    pub fn get(&self, group: BloodGroup) -> GroupCounts {
        self.groups.get(&group).copied().unwrap_or_default()
    }
}

/// Personal dashboard figures for one donor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub total_donations: usize,
    pub lives_saved: usize,
    pub eligible: bool,
    /// `None` means eligible now (never donated)
    pub next_eligible_date: Option<DateTime<Utc>>,
}

/// Which pass of the emergency search produced the donors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Donors of exactly the requested group
    Exact,
    /// Donors of other groups that can give to the requested group
    Compatible,
    None,
}

/// Result of an emergency donor search, borrowing from the searched snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyMatch<'a> {
    pub tier: MatchTier,
    pub donors: Vec<&'a Person>,
}

/// Full data export; on import, each present collection replaces the stored one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    #[serde(default)]
    pub users: Option<Vec<Person>>,
    #[serde(default)]
    pub blood_requests: Option<Vec<BloodRequest>>,
    #[serde(default)]
    pub donations: Option<Vec<Donation>>,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
}
