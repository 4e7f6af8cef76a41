//! Bloodlink - offline blood donation coordination
//!
//! This library provides donor eligibility, ABO/Rh compatibility matching and
//! multi-criteria search over in-memory snapshots of donors, blood requests
//! and donations, plus the record keeping that produces those snapshots.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchingEngine, MatchingOptions, is_eligible, compatible_donor_groups, compatible_recipient_groups};
pub use models::{BloodGroup, BloodRequest, Donation, Hospital, Person, DonorSearchCriteria, RequestSearchCriteria, HospitalSearchCriteria};
pub use services::{Registry, RegistryError, Storage, JsonFileStore, MemoryStore, ValidationFailure};
