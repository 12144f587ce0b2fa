//! Identity fields shared by clients and veterinarians.

use super::validation::{
    validate_text, ValidationResult, MIN_ADDRESS_LEN, MIN_CONTACT_LEN, MIN_NAME_LEN,
};

/// Name, contact and address of a person known to the clinic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    /// Phone number or email
    pub contact: String,
    pub address: String,
}

impl Person {
    /// Create a person, validating every field.
    pub fn new(name: &str, contact: &str, address: &str) -> ValidationResult<Self> {
        Ok(Self {
            name: validate_text("name", name, MIN_NAME_LEN)?,
            contact: validate_text("contact", contact, MIN_CONTACT_LEN)?,
            address: validate_text("address", address, MIN_ADDRESS_LEN)?,
        })
    }
}

/// Anything that can be looked up by its human-readable name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Linear scan by name; the first match wins.
pub fn find_by_name<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    struct Tag(&'static str, u8);

    impl Named for Tag {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_new_person() {
        let person = Person::new("Maria Lopez", "555-0100", "123 Oak St").unwrap();
        assert_eq!(person.name, "Maria Lopez");
        assert_eq!(person.contact, "555-0100");
        assert_eq!(person.address, "123 Oak St");
    }

    #[test]
    fn test_person_rejects_short_contact() {
        let err = Person::new("Maria", "555", "123 Oak St").unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooShort {
                field: "contact",
                min: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn test_find_by_name_first_match_wins() {
        let tags = [Tag("Rex", 1), Tag("Luna", 2), Tag("Rex", 3)];
        assert_eq!(find_by_name(&tags, "Rex").map(|t| t.1), Some(1));
        assert!(find_by_name(&tags, "Max").is_none());
    }
}
