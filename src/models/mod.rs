// Model exports
pub mod domain;
pub mod lenient;
pub mod requests;
pub mod responses;

pub use domain::{BloodGroup, BloodRequest, Donation, Hospital, HospitalType, Location, MedicalInfo, Person, RequestStatus, Role, Urgency};
pub use requests::{BloodRequestForm, Criterion, DonorSearchCriteria, HospitalSearchCriteria, PersonUpdate, RegistrationForm, RequestSearchCriteria, RequestUpdate};
pub use responses::{BloodGroupStats, DataExport, DonationStats, DonorSummary, EmergencyMatch, GroupCounts, MatchTier};
