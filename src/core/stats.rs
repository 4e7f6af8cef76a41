use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::core::eligibility::{is_eligible, next_eligible_date};
use crate::models::{
    BloodGroup, BloodGroupStats, BloodRequest, Donation, DonationStats, DonorSummary, GroupCounts,
    Person, RequestStatus,
};

/// Lives credited per donation on the donor dashboard
pub const LIVES_PER_DONATION: usize = 3;

/// Aggregate totals across all three collections
pub fn donation_stats(
    donations: &[Donation],
    persons: &[Person],
    requests: &[BloodRequest],
) -> DonationStats {
    let total_requests = requests.len();
    let fulfilled_requests = requests
        .iter()
        .filter(|request| request.status == Some(RequestStatus::Fulfilled))
        .count();

    DonationStats {
        total_donations: donations.len(),
        total_donors: persons.iter().filter(|person| person.is_donor()).count(),
        total_requests,
        fulfilled_requests,
        fulfillment_rate: fulfillment_rate(fulfilled_requests, total_requests),
    }
}

/// Percentage rounded to one decimal place; 0 when there is nothing to fulfil
#[inline]
fn fulfillment_rate(fulfilled: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let rate = fulfilled as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

/// Donor, request and donation counts for each of the eight groups
///
/// Donations are attributed through their donor's group. A donation whose
/// donor is missing, or has no group, is left out of every bucket.
pub fn blood_group_stats(
    donations: &[Donation],
    persons: &[Person],
    requests: &[BloodRequest],
) -> BloodGroupStats {
    let mut groups: BTreeMap<BloodGroup, GroupCounts> = BloodGroup::ALL
        .into_iter()
        .map(|group| (group, GroupCounts::default()))
        .collect();

    // First match wins on duplicate ids, like a linear lookup would
    let mut by_id: HashMap<&str, &Person> = HashMap::with_capacity(persons.len());
    for person in persons {
        by_id.entry(person.id.as_str()).or_insert(person);
    }

    for person in persons.iter().filter(|person| person.is_donor()) {
        if let Some(group) = person.blood_group {
            groups.entry(group).or_default().donors += 1;
        }
    }

    for request in requests {
        if let Some(group) = request.blood_group {
            groups.entry(group).or_default().requests += 1;
        }
    }

    for donation in donations {
        let group = by_id
            .get(donation.donor_id.as_str())
            .and_then(|donor| donor.blood_group);

        if let Some(group) = group {
            groups.entry(group).or_default().donations += 1;
        }
    }

    BloodGroupStats { groups }
}

/// Personal dashboard figures for `person`
pub fn donor_summary(person: &Person, donations: &[Donation], as_of: DateTime<Utc>) -> DonorSummary {
    let total_donations = donations
        .iter()
        .filter(|donation| donation.donor_id == person.id)
        .count();

    DonorSummary {
        total_donations,
        lives_saved: total_donations * LIVES_PER_DONATION,
        eligible: is_eligible(person, as_of),
        next_eligible_date: next_eligible_date(person, as_of),
    }
}
