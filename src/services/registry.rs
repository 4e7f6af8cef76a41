use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::eligibility::eligible_date;
use crate::models::lenient::parse_date;
use crate::models::{
    BloodRequest, BloodRequestForm, DataExport, Donation, Location, MedicalInfo, Person, PersonUpdate,
    RegistrationForm, RequestStatus, RequestUpdate,
};
use crate::services::storage::{Collection, Storage, StorageError};
use crate::services::validation::{
    validate_blood_request, validate_registration, validate_request_update, ValidationFailure,
};

/// Errors that can occur when mutating records
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Record keeper over a `Storage` backend
///
/// Loads all three collections on open and writes a whole collection back
/// after every mutation. Read accessors hand out slices suitable as snapshots
/// for `MatchingEngine`.
pub struct Registry<S: Storage> {
    store: S,
    users: Vec<Person>,
    blood_requests: Vec<BloodRequest>,
    donations: Vec<Donation>,
}

impl<S: Storage> Registry<S> {
    pub fn open(store: S) -> Result<Self, RegistryError> {
        let users: Vec<Person> = store.load(Collection::Users)?;
        let blood_requests: Vec<BloodRequest> = store.load(Collection::BloodRequests)?;
        let donations: Vec<Donation> = store.load(Collection::Donations)?;

        info!(
            "Registry opened: {} users, {} requests, {} donations",
            users.len(),
            blood_requests.len(),
            donations.len()
        );

        Ok(Self {
            store,
            users,
            blood_requests,
            donations,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn persons(&self) -> &[Person] {
        &self.users
    }

    pub fn blood_requests(&self) -> &[BloodRequest] {
        &self.blood_requests
    }

    pub fn donations(&self) -> &[Donation] {
        &self.donations
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn blood_request(&self, id: &str) -> Option<&BloodRequest> {
        self.blood_requests.iter().find(|request| request.id == id)
    }

    pub fn donations_by_donor(&self, donor_id: &str) -> Vec<&Donation> {
        self.donations
            .iter()
            .filter(|donation| donation.donor_id == donor_id)
            .collect()
    }

    fn save_users(&self) -> Result<(), StorageError> {
        self.store.save(Collection::Users, &self.users)
    }

    fn save_blood_requests(&self) -> Result<(), StorageError> {
        self.store.save(Collection::BloodRequests, &self.blood_requests)
    }

    fn save_donations(&self) -> Result<(), StorageError> {
        self.store.save(Collection::Donations, &self.donations)
    }

    /// Register a new person after validating the form
    pub fn register(&mut self, form: RegistrationForm, now: DateTime<Utc>) -> Result<Person, RegistryError> {
        validate_registration(&form)?;

        if self.users.iter().any(|user| user.email == form.email) {
            return Err(RegistryError::DuplicateEmail(form.email));
        }

        let last_donation_date = form.last_donation_date.as_deref().and_then(parse_date);

        let person = Person {
            id: new_id("user"),
            name: form.name,
            email: form.email,
            password_hash: form.password,
            phone: form.phone,
            blood_group: form.blood_group.parse().ok(),
            role: form.role.parse().ok(),
            location: Location {
                district: form.district,
                upazila: form.upazila,
                address: form.address,
            },
            medical: MedicalInfo {
                weight_kg: form.weight_kg,
                last_donation_date,
                eligible_date: eligible_date(last_donation_date),
            },
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.users.push(person.clone());
        self.save_users()?;

        info!("Registered {} ({:?})", person.id, person.role);
        Ok(person)
    }

    /// Find the person whose email and password both match exactly
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&Person> {
        self.users
            .iter()
            .find(|user| user.email == email && user.password_hash == password)
    }

    /// Replace the provided fields of a person and bump `updated_at`
    pub fn update_person(
        &mut self,
        id: &str,
        update: PersonUpdate,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        let person = self
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| RegistryError::NotFound(format!("person {}", id)))?;

        if let Some(name) = update.name {
            person.name = name;
        }
        if let Some(phone) = update.phone {
            person.phone = phone;
        }
        if let Some(group) = update.blood_group {
            person.blood_group = Some(group);
        }
        if let Some(district) = update.district {
            person.location.district = district;
        }
        if let Some(upazila) = update.upazila {
            person.location.upazila = upazila;
        }
        if let Some(weight) = update.weight_kg {
            person.medical.weight_kg = weight;
        }
        if let Some(last) = update.last_donation_date {
            person.medical.last_donation_date = Some(last);
            person.medical.eligible_date = eligible_date(Some(last));
        }
        person.updated_at = Some(now);

        let updated = person.clone();
        self.save_users()?;
        Ok(updated)
    }

    /// Remove a person; admin-only at the call site
    pub fn delete_person(&mut self, id: &str) -> Result<Person, RegistryError> {
        let index = self
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or_else(|| RegistryError::NotFound(format!("person {}", id)))?;

        let removed = self.users.remove(index);
        self.save_users()?;

        info!("Deleted person {}", removed.id);
        Ok(removed)
    }

    /// Submit a blood request in the `pending` state
    pub fn submit_request(
        &mut self,
        form: BloodRequestForm,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BloodRequest, RegistryError> {
        validate_blood_request(&form, now)?;

        let location = form
            .district
            .filter(|district| !district.is_empty())
            .map(|district| Location {
                district,
                ..Location::default()
            });

        let request = BloodRequest {
            id: new_id("req"),
            patient_name: form.patient_name,
            blood_group: form.blood_group.parse().ok(),
            units_needed: form.units_needed,
            urgency: form.urgency.parse().ok(),
            hospital_name: form.hospital_name,
            required_date: parse_date(&form.required_date),
            status: Some(RequestStatus::Pending),
            contact_person: form.contact_person,
            contact_phone: form.contact_phone,
            additional_notes: form.additional_notes.filter(|notes| !notes.is_empty()),
            location,
            requester_id: requester_id.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.blood_requests.push(request.clone());
        self.save_blood_requests()?;

        info!("Blood request {} submitted for {:?}", request.id, request.blood_group);
        Ok(request)
    }

    /// Replace the provided fields of a request and bump `updated_at`
    ///
    /// An empty district clears the request's location.
    pub fn update_request(
        &mut self,
        id: &str,
        update: RequestUpdate,
        now: DateTime<Utc>,
    ) -> Result<BloodRequest, RegistryError> {
        validate_request_update(&update)?;

        let request = self
            .blood_requests
            .iter_mut()
            .find(|request| request.id == id)
            .ok_or_else(|| RegistryError::NotFound(format!("blood request {}", id)))?;

        if let Some(name) = update.patient_name {
            request.patient_name = name;
        }
        if let Some(group) = update.blood_group {
            request.blood_group = Some(group);
        }
        if let Some(units) = update.units_needed {
            request.units_needed = units;
        }
        if let Some(urgency) = update.urgency {
            request.urgency = Some(urgency);
        }
        if let Some(hospital) = update.hospital_name {
            request.hospital_name = hospital;
        }
        if let Some(date) = update.required_date {
            request.required_date = Some(date);
        }
        if let Some(status) = update.status {
            request.status = Some(status);
        }
        if let Some(person) = update.contact_person {
            request.contact_person = person;
        }
        if let Some(phone) = update.contact_phone {
            request.contact_phone = phone;
        }
        if let Some(notes) = update.additional_notes {
            request.additional_notes = Some(notes).filter(|notes| !notes.is_empty());
        }
        if let Some(district) = update.district {
            if district.trim().is_empty() {
                request.location = None;
            } else {
                request.location.get_or_insert_with(Location::default).district = district;
            }
        }
        request.updated_at = Some(now);

        let updated = request.clone();
        self.save_blood_requests()?;
        Ok(updated)
    }

    pub fn update_request_status(
        &mut self,
        id: &str,
        status: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<BloodRequest, RegistryError> {
        let update = RequestUpdate {
            status: Some(status),
            ..RequestUpdate::default()
        };
        self.update_request(id, update, now)
    }

    pub fn delete_request(&mut self, id: &str) -> Result<BloodRequest, RegistryError> {
        let index = self
            .blood_requests
            .iter()
            .position(|request| request.id == id)
            .ok_or_else(|| RegistryError::NotFound(format!("blood request {}", id)))?;

        let removed = self.blood_requests.remove(index);
        self.save_blood_requests()?;
        Ok(removed)
    }

    /// Append a donation and move the donor's eligibility window forward
    ///
    /// A donation naming an unknown donor is still recorded. The donor is
    /// written before the donation; on any failed write both are rolled back
    /// in memory, so an `Err` never leaves a stored donation behind.
    pub fn record_donation(
        &mut self,
        donor_id: &str,
        donation_date: DateTime<Utc>,
        hospital_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Donation, RegistryError> {
        let donation = Donation {
            id: new_id("don"),
            donor_id: donor_id.to_string(),
            donation_date: Some(donation_date),
            hospital_name,
            created_at: Some(now),
        };

        let previous = match self.users.iter().position(|user| user.id == donor_id) {
            Some(index) => {
                let previous = self.users[index].clone();
                let donor = &mut self.users[index];
                donor.medical.last_donation_date = Some(donation_date);
                donor.medical.eligible_date = eligible_date(Some(donation_date));
                donor.updated_at = Some(now);
                Some((index, previous))
            }
            None => {
                warn!("Donation {} references unknown donor {}", donation.id, donor_id);
                None
            }
        };

        if let Some((index, previous)) = &previous {
            if let Err(error) = self.save_users() {
                self.users[*index] = previous.clone();
                return Err(error.into());
            }
        }

        self.donations.push(donation.clone());
        if let Err(error) = self.save_donations() {
            self.donations.pop();
            if let Some((index, previous)) = previous {
                self.users[index] = previous;
                if let Err(restore) = self.save_users() {
                    warn!("Could not restore donor {} after a failed donation write: {}", donor_id, restore);
                }
            }
            return Err(error.into());
        }

        info!("Recorded donation {} for {}", donation.id, donor_id);
        Ok(donation)
    }

    pub fn export(&self, now: DateTime<Utc>) -> DataExport {
        DataExport {
            users: Some(self.users.clone()),
            blood_requests: Some(self.blood_requests.clone()),
            donations: Some(self.donations.clone()),
            export_date: Some(now),
        }
    }

    /// Replace every collection present in `data`
    pub fn import(&mut self, data: DataExport) -> Result<(), RegistryError> {
        if let Some(users) = data.users {
            self.users = users;
            self.save_users()?;
        }
        if let Some(requests) = data.blood_requests {
            self.blood_requests = requests;
            self.save_blood_requests()?;
        }
        if let Some(donations) = data.donations {
            self.donations = donations;
            self.save_donations()?;
        }

        info!(
            "Imported data: {} users, {} requests, {} donations",
            self.users.len(),
            self.blood_requests.len(),
            self.donations.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloodGroup, Role, Urgency};
    use crate::services::storage::MemoryStore;
    use chrono::{Duration, TimeZone};
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use std::cell::Cell;
    use std::path::PathBuf;

    /// Memory store whose writes to one collection fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: Cell<Option<Collection>>,
    }

    impl Storage for FlakyStore {
        fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StorageError> {
            self.inner.load(collection)
        }

        fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<(), StorageError> {
            if self.failing.get() == Some(collection) {
                return Err(StorageError::Io {
                    path: PathBuf::from(collection.key()),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.save(collection, records)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn registration(email: &str) -> RegistrationForm {
        RegistrationForm {
            name: "Nusrat Jahan".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            phone: "01712345678".to_string(),
            blood_group: "B-".to_string(),
            role: "donor".to_string(),
            district: "Chattogram".to_string(),
            upazila: "Pahartali".to_string(),
            address: None,
            weight_kg: 58,
            last_donation_date: Some("2024-04-01".to_string()),
        }
    }

    fn request_form() -> BloodRequestForm {
        BloodRequestForm {
            patient_name: "Rafiq".to_string(),
            blood_group: "B-".to_string(),
            units_needed: 3,
            urgency: "emergency".to_string(),
            hospital_name: "Chittagong Medical College Hospital".to_string(),
            contact_person: "Mina".to_string(),
            contact_phone: "+8801912345678".to_string(),
            required_date: "2024-05-03".to_string(),
            additional_notes: Some(String::new()),
            district: Some("Chattogram".to_string()),
        }
    }

    #[test]
    fn test_register_derives_fields() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let person = registry.register(registration("nusrat@example.com"), now()).unwrap();

        assert!(person.id.starts_with("user_"));
        assert_eq!(person.blood_group, Some(BloodGroup::BNeg));
        assert_eq!(person.role, Some(Role::Donor));
        assert_eq!(
            person.medical.eligible_date,
            Some(Utc.with_ymd_and_hms(2024, 5, 27, 0, 0, 0).unwrap())
        );
        assert!(registry.store().raw(Collection::Users).is_some());
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        registry.register(registration("dup@example.com"), now()).unwrap();

        let result = registry.register(registration("dup@example.com"), now());
        assert!(matches!(result, Err(RegistryError::DuplicateEmail(_))));
        assert_eq!(registry.persons().len(), 1);
    }

    #[test]
    fn test_register_surfaces_validation_failure() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let mut form = registration("bad@example.com");
        form.phone = "555".to_string();

        match registry.register(form, now()) {
            Err(RegistryError::Validation(failure)) => assert!(failure.has_field("phone")),
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(registry.persons().is_empty());
    }

    #[test]
    fn test_authenticate_plaintext() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        registry.register(registration("login@example.com"), now()).unwrap();

        assert!(registry.authenticate("login@example.com", "hunter22").is_some());
        assert!(registry.authenticate("login@example.com", "wrong").is_none());
    }

    #[test]
    fn test_submit_request_is_pending() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let request = registry.submit_request(request_form(), "user_x", now()).unwrap();

        assert!(request.id.starts_with("req_"));
        assert_eq!(request.status, Some(RequestStatus::Pending));
        assert_eq!(request.urgency, Some(Urgency::Emergency));
        assert_eq!(request.location.as_ref().map(|l| l.district.as_str()), Some("Chattogram"));
        assert!(request.additional_notes.is_none());
    }

    #[test]
    fn test_update_and_delete_request() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let request = registry.submit_request(request_form(), "user_x", now()).unwrap();

        let later = now() + Duration::hours(3);
        let updated = registry
            .update_request_status(&request.id, RequestStatus::Fulfilled, later)
            .unwrap();
        assert_eq!(updated.status, Some(RequestStatus::Fulfilled));
        assert_eq!(updated.updated_at, Some(later));

        registry.delete_request(&request.id).unwrap();
        assert!(registry.blood_request(&request.id).is_none());
        assert!(matches!(
            registry.delete_request(&request.id),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_record_donation_updates_donor() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let donor = registry.register(registration("giver@example.com"), now()).unwrap();

        let donated = Utc.with_ymd_and_hms(2024, 4, 30, 0, 0, 0).unwrap();
        registry.record_donation(&donor.id, donated, None, now()).unwrap();

        let stored = registry.person(&donor.id).unwrap();
        assert_eq!(stored.medical.last_donation_date, Some(donated));
        assert_eq!(stored.medical.eligible_date, Some(donated + Duration::days(56)));
        assert_eq!(registry.donations_by_donor(&donor.id).len(), 1);
    }

    #[test]
    fn test_record_donation_failed_donor_write_stores_nothing() {
        let mut registry = Registry::open(FlakyStore::default()).unwrap();
        let donor = registry.register(registration("flaky@example.com"), now()).unwrap();
        let before = donor.medical.last_donation_date;

        registry.store().failing.set(Some(Collection::Users));
        let result = registry.record_donation(&donor.id, now(), None, now());
        assert!(matches!(result, Err(RegistryError::Storage(_))));
        assert!(registry.donations().is_empty());
        assert!(registry.store().inner.raw(Collection::Donations).is_none());
        assert_eq!(registry.person(&donor.id).unwrap().medical.last_donation_date, before);

        registry.store().failing.set(None);
        registry.record_donation(&donor.id, now(), None, now()).unwrap();
        let stored: Vec<Donation> = registry.store().inner.load(Collection::Donations).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_record_donation_failed_donation_write_restores_donor() {
        let mut registry = Registry::open(FlakyStore::default()).unwrap();
        let donor = registry.register(registration("restore@example.com"), now()).unwrap();
        let before = donor.medical.last_donation_date;

        registry.store().failing.set(Some(Collection::Donations));
        assert!(registry.record_donation(&donor.id, now(), None, now()).is_err());
        assert!(registry.donations().is_empty());

        let stored: Vec<Person> = registry.store().inner.load(Collection::Users).unwrap();
        assert_eq!(stored[0].medical.last_donation_date, before);
        assert_eq!(registry.person(&donor.id).unwrap().medical.last_donation_date, before);
    }

    #[test]
    fn test_update_request_merges_fields() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let request = registry.submit_request(request_form(), "user_x", now()).unwrap();

        let later = now() + Duration::hours(1);
        let update = RequestUpdate {
            units_needed: Some(5),
            urgency: Some(Urgency::Normal),
            district: Some("Cox's Bazar".to_string()),
            additional_notes: Some("Ward 4".to_string()),
            ..RequestUpdate::default()
        };
        let updated = registry.update_request(&request.id, update, later).unwrap();

        assert_eq!(updated.units_needed, 5);
        assert_eq!(updated.urgency, Some(Urgency::Normal));
        assert_eq!(updated.patient_name, request.patient_name);
        assert_eq!(updated.status, Some(RequestStatus::Pending));
        assert_eq!(updated.location.as_ref().map(|l| l.district.as_str()), Some("Cox's Bazar"));
        assert_eq!(updated.additional_notes.as_deref(), Some("Ward 4"));
        assert_eq!(updated.updated_at, Some(later));
        assert_eq!(updated.created_at, request.created_at);
    }

    #[test]
    fn test_update_request_rejects_invalid_units() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let request = registry.submit_request(request_form(), "user_x", now()).unwrap();

        let update = RequestUpdate {
            units_needed: Some(0),
            ..RequestUpdate::default()
        };
        match registry.update_request(&request.id, update, now()) {
            Err(RegistryError::Validation(failure)) => assert!(failure.has_field("units_needed")),
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert_eq!(registry.blood_request(&request.id).unwrap().units_needed, 3);
    }

    #[test]
    fn test_open_tolerates_both_field_spellings() {
        let store = MemoryStore::new().with_raw(
            Collection::Users,
            r#"[{"id": "u1", "email": "a@example.com", "role": "donor"},
                {"id": "u2", "role": "donor", "userType": "requester",
                 "medical": {}, "medicalInfo": {"weight": 60}}]"#,
        );

        let registry = Registry::open(store).unwrap();
        assert_eq!(registry.persons().len(), 2);
        assert!(registry.person("u2").unwrap().is_donor());
    }

    #[test]
    fn test_record_donation_for_unknown_donor_is_kept() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        registry.record_donation("user_ghost", now(), None, now()).unwrap();
        assert_eq!(registry.donations().len(), 1);
    }

    #[test]
    fn test_update_person_recomputes_eligibility() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let person = registry.register(registration("edit@example.com"), now()).unwrap();

        let last = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();
        let update = PersonUpdate {
            district: Some("Cumilla".to_string()),
            last_donation_date: Some(last),
            ..PersonUpdate::default()
        };
        let updated = registry.update_person(&person.id, update, now()).unwrap();

        assert_eq!(updated.location.district, "Cumilla");
        assert_eq!(updated.location.upazila, "Pahartali");
        assert_eq!(updated.medical.eligible_date, Some(last + Duration::days(56)));
    }

    #[test]
    fn test_delete_person() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        let person = registry.register(registration("gone@example.com"), now()).unwrap();

        registry.delete_person(&person.id).unwrap();
        assert!(registry.person(&person.id).is_none());
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let mut source = Registry::open(MemoryStore::new()).unwrap();
        source.register(registration("a@example.com"), now()).unwrap();
        source.submit_request(request_form(), "user_x", now()).unwrap();
        let exported = source.export(now());

        let mut target = Registry::open(MemoryStore::new()).unwrap();
        target.import(exported).unwrap();
        assert_eq!(target.persons().len(), 1);
        assert_eq!(target.blood_requests().len(), 1);
        assert!(target.donations().is_empty());
    }

    #[test]
    fn test_import_keeps_absent_collections() {
        let mut registry = Registry::open(MemoryStore::new()).unwrap();
        registry.register(registration("keep@example.com"), now()).unwrap();

        let partial = DataExport {
            donations: Some(Vec::new()),
            ..DataExport::default()
        };
        registry.import(partial).unwrap();
        assert_eq!(registry.persons().len(), 1);
    }

    #[test]
    fn test_open_reads_browser_era_records() {
        let store = MemoryStore::new().with_raw(
            Collection::Users,
            r#"[{"id": "user_1", "email": "x@example.com", "password": "pw", "userType": "donor",
                "bloodGroup": "A+", "location": {"district": "Dhaka", "upazila": "Uttara"},
                "medicalInfo": {"weight": 70, "lastDonation": null}}]"#,
        );

        let registry = Registry::open(store).unwrap();
        assert!(registry.authenticate("x@example.com", "pw").is_some());
        assert!(registry.persons()[0].is_donor());
    }
}
