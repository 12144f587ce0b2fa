//! Vet-Clinic Core Library
//!
//! In-memory registry of a veterinary clinic's clients, pets, veterinarians
//! and appointments, persisted to a single JSON store file.
//!
//! # Architecture
//!
//! ```text
//!   Console front end (vet-clinic binary)
//!          │  register / schedule / query
//!          ▼
//!   ┌─────────────────────────────┐
//!   │          Registry           │
//!   │  clients ─► pets ─► history │
//!   │  veterinarians              │
//!   │  appointments (flat)        │
//!   └──────────────┬──────────────┘
//!                  │ encode / decode (per-record diagnostics)
//!                  ▼
//!   ┌─────────────────────────────┐
//!   │ ClinicStore                 │
//!   │ clinic.json  (.backup/.tmp) │
//!   └─────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Record types and field validation
//! - [`registry`]: The registry and its operations
//! - [`store`]: Store document, codec, backup and atomic write
//! - [`config`]: Layered configuration

pub mod config;
pub mod models;
pub mod registry;
pub mod store;

// Re-export commonly used types
pub use config::{ClinicConfig, InputConfig, StoreConfig};
pub use models::{
    format_appointment_time, parse_appointment_time, validate_age, validate_text, Appointment,
    AppointmentId, AppointmentRequest, Client, ClientId, Person, Pet, PetId, ServiceKind,
    ValidationError, VetId, Veterinarian,
};
pub use registry::{ClientMatch, ReferenceError, Registry, RegistryError, RegistryState};
pub use store::{
    ClinicStore, DeserializationError, LoadOutcome, LoadReport, SaveReport, StorageError,
};

use thiserror::Error;

/// Any error the clinic core can report.
#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Bad stored record: {0}")]
    Deserialization(#[from] DeserializationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl From<RegistryError> for ClinicError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Validation(e) => ClinicError::Validation(e),
            RegistryError::Reference(e) => ClinicError::Reference(e),
        }
    }
}

pub type ClinicResult<T> = Result<T, ClinicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_flattens() {
        let pet = PetId::new();
        let err: ClinicError = RegistryError::Reference(ReferenceError::UnknownPet(pet)).into();
        assert!(matches!(err, ClinicError::Reference(ReferenceError::UnknownPet(p)) if p == pet));
        assert_eq!(err.to_string(), format!("Not found: unknown pet {}", pet));
    }

    #[test]
    fn test_validation_error_message() {
        let err: ClinicError = ValidationError::Empty { field: "name" }.into();
        assert_eq!(err.to_string(), "Invalid input: name cannot be empty");
    }
}
