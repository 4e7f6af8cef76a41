use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::{
    compatibility::{can_donate_to, compatible_donor_groups, donor_groups_for_label},
    filters::{is_available_donor, matches_donor_criteria, matches_hospital_criteria, matches_request_criteria},
};
use crate::models::{
    BloodGroup, BloodRequest, DonorSearchCriteria, EmergencyMatch, Hospital, HospitalSearchCriteria,
    MatchTier, Person, RequestSearchCriteria,
};

/// Tunables for the matching engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingOptions {
    /// Fall back to compatible groups when an emergency search finds no
    /// exact-group donors
    pub broaden_emergency: bool,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            broaden_emergency: true,
        }
    }
}

/// Search and matching over caller-supplied snapshots
///
/// The engine holds no records. Every call takes the current collection as a
/// slice and returns references into it, in input order. Nothing here fails:
/// a record with missing or malformed fields simply does not match.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    options: MatchingOptions,
}

impl MatchingEngine {
    pub fn new(options: MatchingOptions) -> Self {
        Self { options }
    }

    pub fn with_default_options() -> Self {
        Self::default()
    }

    /// Donors matching every present criterion
    pub fn search_donors<'a>(
        &self,
        persons: &'a [Person],
        criteria: &DonorSearchCriteria,
        as_of: DateTime<Utc>,
    ) -> Vec<&'a Person> {
        persons
            .iter()
            .filter(|person| matches_donor_criteria(person, criteria, as_of))
            .collect()
    }

    pub fn search_blood_requests<'a>(
        &self,
        requests: &'a [BloodRequest],
        criteria: &RequestSearchCriteria,
    ) -> Vec<&'a BloodRequest> {
        requests
            .iter()
            .filter(|request| matches_request_criteria(request, criteria))
            .collect()
    }

    pub fn search_hospitals<'a>(
        &self,
        hospitals: &'a [Hospital],
        criteria: &HospitalSearchCriteria,
    ) -> Vec<&'a Hospital> {
        hospitals
            .iter()
            .filter(|hospital| matches_hospital_criteria(hospital, criteria))
            .collect()
    }

    /// Hospitals offered when submitting a request
    pub fn blood_bank_hospitals<'a>(&self, hospitals: &'a [Hospital]) -> Vec<&'a Hospital> {
        hospitals.iter().filter(|hospital| hospital.blood_bank).collect()
    }

    /// Newest requests first by `created_at`, at most `limit` of them
    ///
    /// Requests without a creation time sort last; ties keep input order.
    pub fn recent_requests<'a>(&self, requests: &'a [BloodRequest], limit: usize) -> Vec<&'a BloodRequest> {
        let mut recent: Vec<&BloodRequest> = requests.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        recent
    }

    /// Eligible donors in `district` whose group can give to `blood_group`
    pub fn compatible_donors<'a>(
        &self,
        persons: &'a [Person],
        blood_group: BloodGroup,
        district: &str,
        as_of: DateTime<Utc>,
    ) -> Vec<&'a Person> {
        available_in_groups(persons, compatible_donor_groups(blood_group), district, as_of)
    }

    /// `compatible_donors` keyed by a group label; an unknown label finds nobody
    pub fn compatible_donors_for_label<'a>(
        &self,
        persons: &'a [Person],
        label: &str,
        district: &str,
        as_of: DateTime<Utc>,
    ) -> Vec<&'a Person> {
        available_in_groups(persons, donor_groups_for_label(label.trim()), district, as_of)
    }

    /// Emergency search: exact-group donors first, then any donor whose
    /// group can give to `blood_group`
    pub fn find_emergency_donors<'a>(
        &self,
        persons: &'a [Person],
        blood_group: BloodGroup,
        district: &str,
        as_of: DateTime<Utc>,
    ) -> EmergencyMatch<'a> {
        let exact: Vec<&Person> = persons
            .iter()
            .filter(|person| person.blood_group == Some(blood_group))
            .filter(|person| is_available_donor(person, district, as_of))
            .collect();

        if !exact.is_empty() {
            debug!("Emergency search for {} in '{}': {} exact donors", blood_group, district, exact.len());
            return EmergencyMatch {
                tier: MatchTier::Exact,
                donors: exact,
            };
        }

        if !self.options.broaden_emergency {
            return EmergencyMatch {
                tier: MatchTier::None,
                donors: Vec::new(),
            };
        }

        let compatible: Vec<&Person> = persons
            .iter()
            .filter(|person| {
                person
                    .blood_group
                    .is_some_and(|group| can_donate_to(group, blood_group))
            })
            .filter(|person| is_available_donor(person, district, as_of))
            .collect();

        debug!(
            "Emergency search for {} in '{}': no exact donors, {} compatible",
            blood_group,
            district,
            compatible.len()
        );

        let tier = if compatible.is_empty() {
            MatchTier::None
        } else {
            MatchTier::Compatible
        };

        EmergencyMatch {
            tier,
            donors: compatible,
        }
    }
}

fn available_in_groups<'a>(
    persons: &'a [Person],
    acceptable: &[BloodGroup],
    district: &str,
    as_of: DateTime<Utc>,
) -> Vec<&'a Person> {
    persons
        .iter()
        .filter(|person| person.blood_group.is_some_and(|group| acceptable.contains(&group)))
        .filter(|person| is_available_donor(person, district, as_of))
        .collect()
}
