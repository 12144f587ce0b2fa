//! Property tests for record construction and document conversion.

use proptest::prelude::*;
use vet_clinic_core::models::{Client, ClientId, Pet, ValidationError, Veterinarian};
use vet_clinic_core::Registry;

/// Text with no leading/trailing whitespace and at least `min` characters.
fn text(min: usize) -> impl Strategy<Value = String> {
    let middle = min.saturating_sub(2);
    proptest::string::string_regex(&format!("[A-Za-z0-9][A-Za-z0-9 .-]{{{},20}}[A-Za-z0-9]", middle))
        .expect("valid regex")
}

proptest! {
    #[test]
    fn prop_client_document_round_trip(
        name in text(3),
        contact in text(5),
        address in text(5),
    ) {
        let client = Client::new(&name, &contact, &address).unwrap();
        let back = Client::from_document(client.to_document(vec![]).client).unwrap();
        prop_assert_eq!(back, client);
    }

    #[test]
    fn prop_veterinarian_document_round_trip(
        name in text(3),
        contact in text(5),
        address in text(5),
        specialty in text(5),
    ) {
        let vet = Veterinarian::new(&name, &contact, &address, &specialty).unwrap();
        let back = Veterinarian::from_document(vet.to_document()).unwrap();
        prop_assert_eq!(back, vet);
    }

    #[test]
    fn prop_pet_document_round_trip(
        name in text(3),
        species in text(3),
        breed in text(3),
        age in 0u32..40,
    ) {
        let owner = ClientId::new();
        let pet = Pet::new(owner, &name, &species, &breed, age).unwrap();
        let back = Pet::from_document(pet.to_document(vec![]).pet, owner).unwrap();
        prop_assert_eq!(back, pet);
    }

    #[test]
    fn prop_short_name_never_reaches_registry(name in "[A-Za-z]{0,2}") {
        let mut registry = Registry::new();
        match Client::new(&name, "555-0100", "123 Oak St") {
            Ok(client) => {
                registry.add_client(client);
                prop_assert!(false, "accepted name {:?}", name);
            }
            Err(err) => prop_assert!(matches!(
                err,
                ValidationError::Empty { field: "name" } | ValidationError::TooShort { field: "name", .. }
            ), "unexpected validation error: {:?}", err),
        }
        prop_assert!(registry.clients().is_empty());
    }
}
