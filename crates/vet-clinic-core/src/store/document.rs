//! On-disk document shape of the store file.
//!
//! ```text
//! {
//!   "veterinarians": [VetDoc],
//!   "clients": [ClientDoc { .., "mascotas": [PetDoc { .., "historial": [AppointmentDoc] }] }],
//!   "appointments": [AppointmentDoc]
//! }
//! ```
//!
//! The pet-scoped `historial` is the canonical copy of each appointment; the
//! top-level `appointments` list repeats them flat.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AppointmentId, ClientId, PetId, ValidationError, VetId};

/// Root of the store file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicDocument {
    pub veterinarians: Vec<VetDoc>,
    pub clients: Vec<ClientDoc>,
    pub appointments: Vec<AppointmentDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VetDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VetId>,
    pub name: String,
    pub contact: String,
    pub address: String,
    pub specialty: String,
}

/// Client fields without the nested pets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClientId>,
    pub name: String,
    pub contact: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientDoc {
    #[serde(flatten)]
    pub client: ClientHeader,
    #[serde(default)]
    pub mascotas: Vec<PetDoc>,
}

/// Pet fields without the nested history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PetId>,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetDoc {
    #[serde(flatten)]
    pub pet: PetHeader,
    #[serde(default)]
    pub historial: Vec<AppointmentDoc>,
}

/// An appointment, referencing its pet and veterinarian.
///
/// Identifiers are authoritative. The name fields are kept so a reader can
/// make sense of the file, and are used for lookup when an identifier is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AppointmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<PetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veterinarian_id: Option<VetId>,
    #[serde(default)]
    pub pet: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub veterinarian: Option<String>,
    /// Display label of the service, e.g. "Vaccination"
    pub service: String,
    /// `DD/MM/YYYY HH:MM`
    pub date: String,
}

/// Kind of record a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Veterinarian,
    Client,
    Pet,
    Appointment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Veterinarian => "veterinarian",
            RecordKind::Client => "client",
            RecordKind::Pet => "pet",
            RecordKind::Appointment => "appointment",
        };
        f.write_str(name)
    }
}

/// A stored record that could not be turned back into a live entity.
#[derive(Error, Debug)]
pub enum DeserializationError {
    #[error("malformed {record} record: {source}")]
    Malformed {
        record: RecordKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {record} record: {source}")]
    Invalid {
        record: RecordKind,
        #[source]
        source: ValidationError,
    },

    #[error("{record} references unknown {target} '{key}'")]
    Unresolved {
        record: RecordKind,
        target: RecordKind,
        key: String,
    },

    #[error("duplicate {record} id {id}")]
    DuplicateId { record: RecordKind, id: String },

    #[error("appointment {id} in the flat list disagrees with the pet history copy")]
    Conflict { id: AppointmentId },
}

impl DeserializationError {
    pub(crate) fn invalid(record: RecordKind) -> impl FnOnce(ValidationError) -> Self {
        move |source| DeserializationError::Invalid { record, source }
    }
}

/// One record skipped during load or save, with its position in the document.
#[derive(Debug)]
pub struct Diagnostic<E> {
    /// JSON-path-like position, e.g. `clients[0].mascotas[1]`
    pub location: String,
    pub error: E,
}

impl<E: fmt::Display> fmt::Display for Diagnostic<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_doc_keeps_spanish_keys() {
        let doc = ClientDoc {
            client: ClientHeader {
                id: None,
                name: "Maria Lopez".into(),
                contact: "555-0100".into(),
                address: "123 Oak St".into(),
            },
            mascotas: vec![PetDoc {
                pet: PetHeader {
                    id: None,
                    name: "Rex".into(),
                    species: "Dog".into(),
                    breed: "Labrador".into(),
                    age: 3,
                },
                historial: vec![],
            }],
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["name"], "Maria Lopez");
        assert_eq!(value["mascotas"][0]["name"], "Rex");
        assert!(value["mascotas"][0]["historial"].is_array());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_header_ignores_nested_children() {
        let value = serde_json::json!({
            "name": "Maria Lopez",
            "contact": "555-0100",
            "address": "123 Oak St",
            "mascotas": [{"garbage": true}]
        });
        let header: ClientHeader = serde_json::from_value(value).unwrap();
        assert_eq!(header.name, "Maria Lopez");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            location: "appointments[2]".to_string(),
            error: DeserializationError::Unresolved {
                record: RecordKind::Appointment,
                target: RecordKind::Veterinarian,
                key: "Dr. Who".into(),
            },
        };
        assert_eq!(
            diag.to_string(),
            "appointments[2]: appointment references unknown veterinarian 'Dr. Who'"
        );
    }
}
