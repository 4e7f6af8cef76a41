use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;

/// ABO/Rh blood group
///
/// Variant order is the display order used by every per-group report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "AB+")]
    AbPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "O-")]
    ONeg,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APos,
        BloodGroup::ANeg,
        BloodGroup::BPos,
        BloodGroup::BNeg,
        BloodGroup::AbPos,
        BloodGroup::AbNeg,
        BloodGroup::OPos,
        BloodGroup::ONeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APos => "A+",
            BloodGroup::ANeg => "A-",
            BloodGroup::BPos => "B+",
            BloodGroup::BNeg => "B-",
            BloodGroup::AbPos => "AB+",
            BloodGroup::AbNeg => "AB-",
            BloodGroup::OPos => "O+",
            BloodGroup::ONeg => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| format!("unknown blood group: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Requester,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Role::Donor),
            "requester" => Ok(Role::Requester),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Display priority of a request; never used for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Urgent,
    Emergency,
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Urgency::Normal),
            "urgent" => Ok(Urgency::Urgent),
            "emergency" => Ok(Urgency::Emergency),
            other => Err(format!("unknown urgency: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unknown request status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HospitalType {
    Government,
    Private,
}

impl FromStr for HospitalType {
    type Err = String;

    /// Case-insensitive, matching how the hospital filter compares types
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "government" => Ok(HospitalType::Government),
            "private" => Ok(HospitalType::Private),
            _ => Err(format!("unknown hospital type: {}", s)),
        }
    }
}

/// Administrative location of a person or request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub district: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub upazila: String,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub address: Option<String>,
}

/// Donor medical data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "MedicalRecord")]
pub struct MedicalInfo {
    pub weight_kg: u16,
    pub last_donation_date: Option<DateTime<Utc>>,
    /// Derived from `last_donation_date`; see `core::eligibility::eligible_date`
    pub eligible_date: Option<DateTime<Utc>>,
}

/// Stored shape of `MedicalInfo`
///
/// Browser-era data used different keys. Both spellings are read and the
/// current key wins when a record carries both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MedicalRecord {
    #[serde(default, deserialize_with = "lenient::optional")]
    weight_kg: Option<u16>,
    #[serde(default, deserialize_with = "lenient::optional")]
    weight: Option<u16>,
    #[serde(default, deserialize_with = "lenient::date")]
    last_donation_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::date")]
    last_donation: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::date")]
    eligible_date: Option<DateTime<Utc>>,
}

impl From<MedicalRecord> for MedicalInfo {
    fn from(record: MedicalRecord) -> Self {
        Self {
            weight_kg: record.weight_kg.or(record.weight).unwrap_or_default(),
            last_donation_date: record.last_donation_date.or(record.last_donation),
            eligible_date: record.eligible_date,
        }
    }
}

/// A registered user: donor, requester or admin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PersonRecord")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Stored and compared as-is
    pub password_hash: String,
    pub phone: String,
    pub blood_group: Option<BloodGroup>,
    pub role: Option<Role>,
    pub location: Location,
    pub medical: MedicalInfo,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stored shape of `Person`, with the same two-spelling rule as `MedicalRecord`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonRecord {
    #[serde(default, deserialize_with = "lenient::or_default")]
    id: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    email: String,
    #[serde(default, deserialize_with = "lenient::optional")]
    password_hash: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional")]
    password: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    phone: String,
    #[serde(default, deserialize_with = "lenient::optional")]
    blood_group: Option<BloodGroup>,
    #[serde(default, deserialize_with = "lenient::optional")]
    role: Option<Role>,
    #[serde(default, deserialize_with = "lenient::optional")]
    user_type: Option<Role>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    location: Location,
    #[serde(default, deserialize_with = "lenient::optional")]
    medical: Option<MedicalInfo>,
    #[serde(default, deserialize_with = "lenient::optional")]
    medical_info: Option<MedicalInfo>,
    #[serde(default, deserialize_with = "lenient::date")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::date")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<PersonRecord> for Person {
    fn from(record: PersonRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash.or(record.password).unwrap_or_default(),
            phone: record.phone,
            blood_group: record.blood_group,
            role: record.role.or(record.user_type),
            location: record.location,
            medical: record.medical.or(record.medical_info).unwrap_or_default(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl Person {
    pub fn is_donor(&self) -> bool {
        self.role == Some(Role::Donor)
    }
}

/// A request for blood on behalf of a patient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub units_needed: u8,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub urgency: Option<Urgency>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub hospital_name: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub required_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub status: Option<RequestStatus>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub contact_person: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub contact_phone: String,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub additional_notes: Option<String>,
    /// Absent location means district searches never match this request
    #[serde(default, deserialize_with = "lenient::optional")]
    pub location: Option<Location>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub requester_id: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A completed donation; append-only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub donor_id: String,
    #[serde(default, deserialize_with = "lenient::date")]
    pub donation_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub hospital_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Static hospital reference entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub name: String,
    #[serde(default)]
    pub district: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::parsed")]
    pub hospital_type: Option<HospitalType>,
    #[serde(default)]
    pub blood_bank: bool,
    #[serde(default)]
    pub specialties: BTreeSet<String>,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency: Option<String>,
}
