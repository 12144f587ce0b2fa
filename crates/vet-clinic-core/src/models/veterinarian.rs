//! Veterinarian records.

use super::ids::VetId;
use super::person::{Named, Person};
use super::validation::{validate_text, ValidationResult, MIN_SPECIALTY_LEN};
use crate::store::{DeserializationError, RecordKind, VetDoc};

/// A veterinarian working at the clinic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Veterinarian {
    pub id: VetId,
    pub person: Person,
    /// Area of practice, e.g. "Surgery"
    pub specialty: String,
}

impl Veterinarian {
    /// Create a new veterinarian with a fresh id.
    pub fn new(name: &str, contact: &str, address: &str, specialty: &str) -> ValidationResult<Self> {
        Ok(Self {
            id: VetId::new(),
            person: Person::new(name, contact, address)?,
            specialty: validate_text("specialty", specialty, MIN_SPECIALTY_LEN)?,
        })
    }

    pub fn to_document(&self) -> VetDoc {
        VetDoc {
            id: Some(self.id),
            name: self.person.name.clone(),
            contact: self.person.contact.clone(),
            address: self.person.address.clone(),
            specialty: self.specialty.clone(),
        }
    }

    /// Rebuild from a stored document; a missing id is replaced by a fresh one.
    pub fn from_document(doc: VetDoc) -> Result<Self, DeserializationError> {
        let mut vet = Self::new(&doc.name, &doc.contact, &doc.address, &doc.specialty)
            .map_err(DeserializationError::invalid(RecordKind::Veterinarian))?;
        if let Some(id) = doc.id {
            vet.id = id;
        }
        Ok(vet)
    }
}

impl Named for Veterinarian {
    fn name(&self) -> &str {
        &self.person.name
    }
}
