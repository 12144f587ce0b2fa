//! Client records.

use super::ids::{ClientId, PetId};
use super::person::{Named, Person};
use super::pet::Pet;
use super::validation::ValidationResult;
use crate::store::{ClientDoc, ClientHeader, DeserializationError, PetDoc, RecordKind};

/// A pet owner and the pets they own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub person: Person,
    pets: Vec<Pet>,
}

impl Client {
    /// Create a new client with a fresh id and no pets.
    pub fn new(name: &str, contact: &str, address: &str) -> ValidationResult<Self> {
        Ok(Self {
            id: ClientId::new(),
            person: Person::new(name, contact, address)?,
            pets: Vec::new(),
        })
    }

    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    pub fn pet(&self, id: PetId) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == id)
    }

    pub(crate) fn pet_mut(&mut self, id: PetId) -> Option<&mut Pet> {
        self.pets.iter_mut().find(|p| p.id == id)
    }

    /// Append `pet` unless one with the same id is already here.
    ///
    /// Returns `false` when the pet was already present.
    pub(crate) fn attach_pet(&mut self, mut pet: Pet) -> bool {
        if self.pet(pet.id).is_some() {
            return false;
        }
        pet.set_owner(self.id);
        self.pets.push(pet);
        true
    }

    pub(crate) fn detach_pet(&mut self, id: PetId) -> Option<Pet> {
        let index = self.pets.iter().position(|p| p.id == id)?;
        Some(self.pets.remove(index))
    }

    pub fn to_document(&self, mascotas: Vec<PetDoc>) -> ClientDoc {
        ClientDoc {
            client: ClientHeader {
                id: Some(self.id),
                name: self.person.name.clone(),
                contact: self.person.contact.clone(),
                address: self.person.address.clone(),
            },
            mascotas,
        }
    }

    /// Rebuild the client without pets; pets are attached as they decode.
    pub fn from_document(header: ClientHeader) -> Result<Self, DeserializationError> {
        let mut client = Self::new(&header.name, &header.contact, &header.address)
            .map_err(DeserializationError::invalid(RecordKind::Client))?;
        if let Some(id) = header.id {
            client.id = id;
        }
        Ok(client)
    }
}

impl Named for Client {
    fn name(&self) -> &str {
        &self.person.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_client() -> Client {
        Client::new("Maria Lopez", "555-0100", "123 Oak St").unwrap()
    }

    #[test]
    fn test_attach_pet_sets_owner() {
        let mut client = make_client();
        let pet = Pet::new(ClientId::new(), "Rex", "Dog", "Labrador", 3).unwrap();
        let pet_id = pet.id;

        assert!(client.attach_pet(pet));
        assert_eq!(client.pet(pet_id).unwrap().owner(), client.id);
    }

    #[test]
    fn test_attach_pet_twice_is_noop() {
        let mut client = make_client();
        let pet = Pet::new(client.id, "Rex", "Dog", "Labrador", 3).unwrap();

        assert!(client.attach_pet(pet.clone()));
        assert!(!client.attach_pet(pet));
        assert_eq!(client.pets().len(), 1);
    }

    #[test]
    fn test_detach_pet() {
        let mut client = make_client();
        let pet = Pet::new(client.id, "Rex", "Dog", "Labrador", 3).unwrap();
        let pet_id = pet.id;
        client.attach_pet(pet);

        assert_eq!(client.detach_pet(pet_id).map(|p| p.id), Some(pet_id));
        assert!(client.pets().is_empty());
        assert!(client.detach_pet(pet_id).is_none());
    }

    #[test]
    fn test_from_document_ignores_pets() {
        let client = make_client();
        let doc = client.to_document(vec![]);
        let back = Client::from_document(doc.client).unwrap();
        assert_eq!(back.id, client.id);
        assert_eq!(back.person, client.person);
    }
}
