use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use validator::Validate;

use crate::models::domain::{BloodGroup, HospitalType, RequestStatus, Urgency};
use crate::services::validation::{
    validate_blood_group, validate_phone, validate_role, validate_urgency,
};

/// Exact-match constraint on one enumerated field of a search
///
/// Search forms send `""` for "any", so blank input is `Any`. Text that names
/// no known value is kept as `Unrecognized` and matches no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion<T> {
    Any,
    Is(T),
    Unrecognized(String),
}

impl<T> Default for Criterion<T> {
    fn default() -> Self {
        Criterion::Any
    }
}

impl<T> Criterion<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Criterion::Any)
    }
}

impl<T: PartialEq> Criterion<T> {
    /// Whether a record's value passes this constraint
    #[inline]
    pub fn admits(&self, value: Option<&T>) -> bool {
        match self {
            Criterion::Any => true,
            Criterion::Is(wanted) => value == Some(wanted),
            Criterion::Unrecognized(_) => false,
        }
    }
}

impl<T: FromStr> Criterion<T> {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Criterion::Any;
        }
        raw.parse()
            .map(Criterion::Is)
            .unwrap_or_else(|_| Criterion::Unrecognized(raw.to_string()))
    }
}

impl<T> From<Option<T>> for Criterion<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Criterion::Any, Criterion::Is)
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Criterion<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Criterion::Any,
            Some(Value::String(text)) => Criterion::parse(&text),
            Some(other) => Criterion::Unrecognized(other.to_string()),
        })
    }
}

impl<T: Serialize> Serialize for Criterion<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Criterion::Any => serializer.serialize_none(),
            Criterion::Is(value) => value.serialize(serializer),
            Criterion::Unrecognized(text) => serializer.serialize_str(text),
        }
    }
}

/// Donor search criteria; every field is optional and AND-combined
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSearchCriteria {
    #[serde(default)]
    pub blood_group: Criterion<BloodGroup>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub upazila: Option<String>,
    #[serde(default)]
    pub eligible_only: bool,
}

/// Blood request search criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSearchCriteria {
    #[serde(default)]
    pub blood_group: Criterion<BloodGroup>,
    #[serde(default)]
    pub status: Criterion<RequestStatus>,
    #[serde(default)]
    pub urgency: Criterion<Urgency>,
    #[serde(default)]
    pub district: Option<String>,
}

/// Hospital directory search criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSearchCriteria {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub blood_bank_only: bool,
    #[serde(rename = "type", default)]
    pub hospital_type: Criterion<HospitalType>,
}

/// Raw registration form, as typed by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[validate(length(min = 2, message = "Minimum 2 characters required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Minimum 6 characters required"))]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_blood_group"))]
    pub blood_group: String,
    #[validate(custom(function = "validate_role"))]
    pub role: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub district: String,
    #[serde(default)]
    pub upazila: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub weight_kg: u16,
    #[serde(default)]
    pub last_donation_date: Option<String>,
}

/// Raw blood request form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequestForm {
    #[validate(length(min = 2, message = "Minimum 2 characters required"))]
    pub patient_name: String,
    #[validate(custom(function = "validate_blood_group"))]
    pub blood_group: String,
    #[validate(range(min = 1, max = 10, message = "Units needed must be between 1 and 10"))]
    pub units_needed: u8,
    #[validate(custom(function = "validate_urgency"))]
    pub urgency: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub hospital_name: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub contact_person: String,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: String,
    /// Checked against the submission clock, not by the derive
    pub required_date: String,
    #[serde(default)]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

/// Whole-field replacement of a person's editable fields
///
/// `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub district: Option<String>,
    pub upazila: Option<String>,
    pub weight_kg: Option<u16>,
    pub last_donation_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Whole-field replacement of a blood request; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdate {
    pub patient_name: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub units_needed: Option<u8>,
    pub urgency: Option<Urgency>,
    pub hospital_name: Option<String>,
    pub required_date: Option<chrono::DateTime<chrono::Utc>>,
    pub status: Option<RequestStatus>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub additional_notes: Option<String>,
    pub district: Option<String>,
}
