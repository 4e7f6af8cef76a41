use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::domain::{BloodGroup, Role, Urgency};
use crate::models::lenient::parse_date;
use crate::models::{BloodRequestForm, RegistrationForm, RequestUpdate};

/// Bangladesh mobile number, optionally with the +88 country prefix
static BD_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+88)?01[3-9]\d{8}$").expect("phone pattern is valid"));

/// Lowest weight accepted for a donor registration
pub const MIN_DONOR_WEIGHT_KG: u16 = 50;

/// Field name to messages for every rule a form broke
///
/// Returned to the caller as a value; an empty failure means the form passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{}", self.summary())]
pub struct ValidationFailure {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationFailure {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Every message as `field: message`, joined with `; `
    pub fn summary(&self) -> String {
        self.fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |message| format!("{}: {}", field, message)))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for ValidationFailure {
    fn from(errors: ValidationErrors) -> Self {
        let mut failure = ValidationFailure::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                failure.add(field.to_string(), message);
            }
        }
        failure
    }
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() {
        return Err(rule("required", "This field is required"));
    }
    if !BD_PHONE.is_match(phone) {
        return Err(rule(
            "phone",
            "Please enter a valid Bangladesh phone number (+8801XXXXXXXXX)",
        ));
    }
    Ok(())
}

pub fn validate_blood_group(group: &str) -> Result<(), ValidationError> {
    group
        .parse::<BloodGroup>()
        .map(|_| ())
        .map_err(|_| rule("blood_group", "Please select a valid blood group"))
}

pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    role.parse::<Role>()
        .map(|_| ())
        .map_err(|_| rule("role", "Please select a valid account type"))
}

pub fn validate_urgency(urgency: &str) -> Result<(), ValidationError> {
    urgency
        .parse::<Urgency>()
        .map(|_| ())
        .map_err(|_| rule("urgency", "Please select a valid urgency"))
}

/// Validate a registration form, including the cross-field rules
pub fn validate_registration(form: &RegistrationForm) -> Result<(), ValidationFailure> {
    let mut failure = form
        .validate()
        .err()
        .map(ValidationFailure::from)
        .unwrap_or_default();

    if form.password != form.confirm_password {
        failure.add("confirm_password", "Passwords do not match");
    }

    if form.role == "donor" && form.weight_kg < MIN_DONOR_WEIGHT_KG {
        failure.add("weight_kg", format!("Value must be at least {}", MIN_DONOR_WEIGHT_KG));
    }

    if let Some(raw) = form.last_donation_date.as_deref().filter(|raw| !raw.is_empty()) {
        if parse_date(raw).is_none() {
            failure.add("last_donation_date", "Please enter a valid date");
        }
    }

    failure.into_result()
}

/// Validate a blood request form; the required date must be after `now`
pub fn validate_blood_request(
    form: &BloodRequestForm,
    now: DateTime<Utc>,
) -> Result<(), ValidationFailure> {
    let mut failure = form
        .validate()
        .err()
        .map(ValidationFailure::from)
        .unwrap_or_default();

    match parse_date(&form.required_date) {
        None if form.required_date.trim().is_empty() => {
            failure.add("required_date", "This field is required")
        }
        None => failure.add("required_date", "Please enter a valid date"),
        Some(date) if date <= now => failure.add("required_date", "Date must be in the future"),
        Some(_) => {}
    }

    failure.into_result()
}

/// Check the fields a request update replaces against the submission rules
pub fn validate_request_update(update: &RequestUpdate) -> Result<(), ValidationFailure> {
    let mut failure = ValidationFailure::default();

    if let Some(name) = &update.patient_name {
        if name.chars().count() < 2 {
            failure.add("patient_name", "Minimum 2 characters required");
        }
    }

    if let Some(units) = update.units_needed {
        if !(1..=10).contains(&units) {
            failure.add("units_needed", "Units needed must be between 1 and 10");
        }
    }

    for (field, value) in [
        ("hospital_name", &update.hospital_name),
        ("contact_person", &update.contact_person),
    ] {
        if value.as_deref().is_some_and(|text| text.trim().is_empty()) {
            failure.add(field, "This field is required");
        }
    }

    if let Some(phone) = &update.contact_phone {
        if let Err(error) = validate_phone(phone) {
            let message = error
                .message
                .map(|message| message.to_string())
                .unwrap_or_else(|| error.code.to_string());
            failure.add("contact_phone", message);
        }
    }

    failure.into_result()
}
