//! Pet records.

use super::ids::{AppointmentId, ClientId, PetId};
use super::person::Named;
use super::validation::{validate_text, ValidationResult, MIN_NAME_LEN, MIN_PET_FIELD_LEN};
use crate::store::{AppointmentDoc, DeserializationError, PetDoc, PetHeader, RecordKind};

/// A pet, always owned by exactly one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    /// e.g. "Dog", "Cat"
    pub species: String,
    pub breed: String,
    /// Age in years
    pub age: u32,
    owner: ClientId,
    /// Appointment ids, oldest first
    history: Vec<AppointmentId>,
}

impl Pet {
    /// Create a new pet for `owner` with an empty history.
    pub fn new(
        owner: ClientId,
        name: &str,
        species: &str,
        breed: &str,
        age: u32,
    ) -> ValidationResult<Self> {
        Ok(Self {
            id: PetId::new(),
            name: validate_text("name", name, MIN_NAME_LEN)?,
            species: validate_text("species", species, MIN_PET_FIELD_LEN)?,
            breed: validate_text("breed", breed, MIN_PET_FIELD_LEN)?,
            age,
            owner,
            history: Vec::new(),
        })
    }

    pub fn owner(&self) -> ClientId {
        self.owner
    }

    pub fn history(&self) -> &[AppointmentId] {
        &self.history
    }

    pub(crate) fn set_owner(&mut self, owner: ClientId) {
        self.owner = owner;
    }

    pub(crate) fn push_history(&mut self, appointment: AppointmentId) {
        self.history.push(appointment);
    }

    /// Document form; `historial` is supplied by the caller since the
    /// appointments themselves live in the registry.
    pub fn to_document(&self, historial: Vec<AppointmentDoc>) -> PetDoc {
        PetDoc {
            pet: PetHeader {
                id: Some(self.id),
                name: self.name.clone(),
                species: self.species.clone(),
                breed: self.breed.clone(),
                age: self.age,
            },
            historial,
        }
    }

    /// Rebuild the pet's own fields; history is re-attached as appointments load.
    pub fn from_document(header: PetHeader, owner: ClientId) -> Result<Self, DeserializationError> {
        let mut pet = Self::new(owner, &header.name, &header.species, &header.breed, header.age)
            .map_err(DeserializationError::invalid(RecordKind::Pet))?;
        if let Some(id) = header.id {
            pet.id = id;
        }
        Ok(pet)
    }
}

impl Named for Pet {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    #[test]
    fn test_new_pet() {
        let owner = ClientId::new();
        let pet = Pet::new(owner, "Rex", "Dog", "Labrador", 3).unwrap();
        assert_eq!(pet.owner(), owner);
        assert_eq!(pet.age, 3);
        assert!(pet.history().is_empty());
    }

    #[test]
    fn test_short_breed_rejected() {
        let err = Pet::new(ClientId::new(), "Rex", "Dog", "La", 3).unwrap_err();
        assert!(matches!(err, ValidationError::TooShort { field: "breed", .. }));
    }

    #[test]
    fn test_document_round_trip_keeps_id() {
        let owner = ClientId::new();
        let pet = Pet::new(owner, "Rex", "Dog", "Labrador", 3).unwrap();

        let doc = pet.to_document(vec![]);
        let back = Pet::from_document(doc.pet, owner).unwrap();
        assert_eq!(back, pet);
    }
}
