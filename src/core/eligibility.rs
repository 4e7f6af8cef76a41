use chrono::{DateTime, Duration, Utc};

use crate::models::Person;

/// Minimum gap between two donations by the same donor
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 56;

#[inline]
fn window() -> Duration {
    Duration::days(ELIGIBILITY_WINDOW_DAYS)
}

/// Check whether a person may donate at `as_of`
///
/// A missing (or unparseable, which loads as missing) last donation date means
/// the person has never donated and is always eligible. Otherwise the full
/// 56 x 86400 seconds must have elapsed; the delta is not rounded.
#[inline]
pub fn is_eligible(person: &Person, as_of: DateTime<Utc>) -> bool {
    match person.medical.last_donation_date {
        None => true,
        Some(last) => as_of.signed_duration_since(last) >= window(),
    }
}

/// Derive the eligible date stored alongside a last donation date
pub fn eligible_date(last_donation: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    last_donation.and_then(|last| last.checked_add_signed(window()))
}

/// Date the person becomes eligible again, or `None` if they already are
pub fn next_eligible_date(person: &Person, as_of: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if is_eligible(person, as_of) {
        None
    } else {
        eligible_date(person.medical.last_donation_date)
    }
}
