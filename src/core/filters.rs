use chrono::{DateTime, Utc};

use crate::core::eligibility::is_eligible;
use crate::models::{BloodRequest, DonorSearchCriteria, Hospital, HospitalSearchCriteria, Person, RequestSearchCriteria};

/// Case-insensitive substring test used for every district/upazila filter
#[inline]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A text criterion constrains only when present and non-empty
#[inline]
fn active(criterion: &Option<String>) -> Option<&str> {
    criterion.as_deref().filter(|text| !text.trim().is_empty())
}

/// Check a person against donor search criteria
///
/// Non-donors never match. A person missing a field the criteria constrain
/// does not match.
#[inline]
pub fn matches_donor_criteria(
    person: &Person,
    criteria: &DonorSearchCriteria,
    as_of: DateTime<Utc>,
) -> bool {
    if !person.is_donor() {
        return false;
    }

    if !criteria.blood_group.admits(person.blood_group.as_ref()) {
        return false;
    }

    if let Some(district) = active(&criteria.district) {
        if !contains_ignore_case(&person.location.district, district) {
            return false;
        }
    }

    if let Some(upazila) = active(&criteria.upazila) {
        if !contains_ignore_case(&person.location.upazila, upazila) {
            return false;
        }
    }

    if criteria.eligible_only && !is_eligible(person, as_of) {
        return false;
    }

    true
}

/// Check a blood request against search criteria
///
/// A request with no location never matches a district criterion.
#[inline]
pub fn matches_request_criteria(request: &BloodRequest, criteria: &RequestSearchCriteria) -> bool {
    if !criteria.blood_group.admits(request.blood_group.as_ref())
        || !criteria.status.admits(request.status.as_ref())
        || !criteria.urgency.admits(request.urgency.as_ref())
    {
        return false;
    }

    if let Some(district) = active(&criteria.district) {
        match &request.location {
            Some(location) if contains_ignore_case(&location.district, district) => {}
            _ => return false,
        }
    }

    true
}

#[inline]
pub fn matches_hospital_criteria(hospital: &Hospital, criteria: &HospitalSearchCriteria) -> bool {
    if let Some(district) = active(&criteria.district) {
        if !contains_ignore_case(&hospital.district, district) {
            return false;
        }
    }

    if criteria.blood_bank_only && !hospital.blood_bank {
        return false;
    }

    criteria.hospital_type.admits(hospital.hospital_type.as_ref())
}

/// Donor in the district who can give today; the shared tail of every
/// emergency and compatibility search
#[inline]
pub fn is_available_donor(person: &Person, district: &str, as_of: DateTime<Utc>) -> bool {
    person.is_donor()
        && contains_ignore_case(&person.location.district, district)
        && is_eligible(person, as_of)
}
