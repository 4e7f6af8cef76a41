// Service exports
pub mod hospitals;
pub mod registry;
pub mod storage;
pub mod validation;

pub use hospitals::{load_hospitals, parse_hospitals, HospitalError};
pub use registry::{Registry, RegistryError};
pub use storage::{Collection, JsonFileStore, MemoryStore, Storage, StorageError};
pub use validation::{validate_blood_request, validate_registration, validate_request_update, ValidationFailure};
