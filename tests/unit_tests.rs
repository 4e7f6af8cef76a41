// Unit tests for Bloodlink

use bloodlink::core::{
    compatibility::{compatible_donor_groups, compatible_recipient_groups},
    eligibility::{eligible_date, is_eligible, ELIGIBILITY_WINDOW_DAYS},
    filters::{matches_donor_criteria, matches_hospital_criteria, matches_request_criteria},
    stats::donation_stats,
};
use bloodlink::models::{
    BloodGroup, BloodRequest, Criterion, DonorSearchCriteria, Hospital, HospitalSearchCriteria, HospitalType,
    Location, Person, RequestSearchCriteria, RequestStatus, Role,
};
use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeSet;

fn create_test_donor(group: BloodGroup, district: &str) -> Person {
    Person {
        id: "donor".to_string(),
        name: "Test Donor".to_string(),
        email: "donor@example.com".to_string(),
        blood_group: Some(group),
        role: Some(Role::Donor),
        location: Location {
            district: district.to_string(),
            upazila: "Sadar".to_string(),
            address: None,
        },
        ..Person::default()
    }
}

fn as_set(groups: &[BloodGroup]) -> BTreeSet<BloodGroup> {
    groups.iter().copied().collect()
}

#[test]
fn test_never_donated_is_always_eligible() {
    let person = create_test_donor(BloodGroup::APos, "Dhaka");
    let far_past = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();

    assert!(is_eligible(&person, far_past));
    assert!(is_eligible(&person, Utc::now()));
}

#[test]
fn test_eligibility_boundary_days() {
    let last = Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap();
    let mut person = create_test_donor(BloodGroup::APos, "Dhaka");
    person.medical.last_donation_date = Some(last);

    assert!(is_eligible(&person, last + Duration::days(ELIGIBILITY_WINDOW_DAYS)));
    assert!(!is_eligible(&person, last + Duration::days(55)));
}

#[test]
fn test_unparseable_last_donation_is_eligible() {
    let person: Person = serde_json::from_str(
        r#"{"role": "donor", "bloodGroup": "O+", "medical": {"lastDonationDate": "yesterday-ish"}}"#,
    )
    .unwrap();

    assert!(is_eligible(&person, Utc::now()));
}

#[test]
fn test_eligible_date_is_56_days_later() {
    let last = Utc.with_ymd_and_hms(2023, 12, 20, 0, 0, 0).unwrap();
    assert_eq!(
        eligible_date(Some(last)),
        Some(Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap())
    );
}

#[test]
fn test_compatibility_table_spot_checks() {
    assert_eq!(as_set(compatible_donor_groups(BloodGroup::ONeg)), as_set(&[BloodGroup::ONeg]));
    assert_eq!(compatible_donor_groups(BloodGroup::AbPos).len(), 8);
    assert_eq!(
        as_set(compatible_donor_groups(BloodGroup::BPos)),
        as_set(&[BloodGroup::BPos, BloodGroup::BNeg, BloodGroup::OPos, BloodGroup::ONeg])
    );
    assert_eq!(
        as_set(compatible_recipient_groups(BloodGroup::AbNeg)),
        as_set(&[BloodGroup::AbPos, BloodGroup::AbNeg])
    );
}

#[test]
fn test_donor_criteria_eligible_only() {
    let now = Utc::now();
    let mut person = create_test_donor(BloodGroup::APos, "Dhaka");
    person.medical.last_donation_date = Some(now - Duration::days(30));

    let criteria = DonorSearchCriteria {
        blood_group: Criterion::Is(BloodGroup::APos),
        eligible_only: true,
        ..DonorSearchCriteria::default()
    };

    assert!(!matches_donor_criteria(&person, &criteria, now));
    assert!(matches_donor_criteria(&person, &criteria, now + Duration::days(26)));
}

#[test]
fn test_donor_without_location_fails_district_criterion() {
    let person: Person = serde_json::from_str(r#"{"role": "donor", "bloodGroup": "B+"}"#).unwrap();
    let criteria = DonorSearchCriteria {
        district: Some("Dhaka".to_string()),
        ..DonorSearchCriteria::default()
    };

    assert!(!matches_donor_criteria(&person, &criteria, Utc::now()));
}

#[test]
fn test_request_criteria_all_fields() {
    let request = BloodRequest {
        blood_group: Some(BloodGroup::OPos),
        status: Some(RequestStatus::Pending),
        location: Some(Location {
            district: "Narayanganj".to_string(),
            ..Location::default()
        }),
        ..BloodRequest::default()
    };

    let criteria = RequestSearchCriteria {
        blood_group: Criterion::Is(BloodGroup::OPos),
        status: Criterion::Is(RequestStatus::Pending),
        urgency: Criterion::Any,
        district: Some("narayan".to_string()),
    };

    assert!(matches_request_criteria(&request, &criteria));
}

#[test]
fn test_request_criteria_from_blank_form() {
    let request = BloodRequest {
        blood_group: Some(BloodGroup::ANeg),
        status: Some(RequestStatus::Fulfilled),
        ..BloodRequest::default()
    };

    let blank: RequestSearchCriteria =
        serde_json::from_str(r#"{"bloodGroup": "", "status": "", "urgency": "", "district": ""}"#).unwrap();
    assert!(matches_request_criteria(&request, &blank));

    let unknown: RequestSearchCriteria = serde_json::from_str(r#"{"bloodGroup": "A negative"}"#).unwrap();
    assert!(!matches_request_criteria(&request, &unknown));
}

#[test]
fn test_hospital_missing_type_fails_type_criterion() {
    let hospital = Hospital {
        name: "Clinic".to_string(),
        district: "Dhaka".to_string(),
        hospital_type: None,
        blood_bank: true,
        specialties: BTreeSet::new(),
        contact: String::new(),
        address: None,
        emergency: None,
    };
    let criteria = HospitalSearchCriteria {
        hospital_type: Criterion::Is(HospitalType::Government),
        ..HospitalSearchCriteria::default()
    };

    assert!(!matches_hospital_criteria(&hospital, &criteria));
    assert!(matches_hospital_criteria(&hospital, &HospitalSearchCriteria::default()));
}

#[test]
fn test_stats_without_requests() {
    let persons = vec![create_test_donor(BloodGroup::ONeg, "Dhaka")];
    let stats = donation_stats(&[], &persons, &[]);

    assert_eq!(stats.total_donors, 1);
    assert_eq!(stats.fulfillment_rate, 0.0);
}
