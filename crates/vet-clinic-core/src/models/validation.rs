//! Field validation rules shared by every record type.
//!
//! Each rule is a standalone step returning `Result`, so the console front end
//! can check a field as soon as it is typed and re-prompt on failure.

use thiserror::Error;

/// Minimum length of a person's or pet's name.
pub const MIN_NAME_LEN: usize = 3;
/// Minimum length of a contact string (phone, email).
pub const MIN_CONTACT_LEN: usize = 5;
/// Minimum length of an address.
pub const MIN_ADDRESS_LEN: usize = 5;
/// Minimum length of a veterinarian's specialty.
pub const MIN_SPECIALTY_LEN: usize = 5;
/// Minimum length of a pet's species and breed.
pub const MIN_PET_FIELD_LEN: usize = 3;

/// A user-supplied field broke one of the record rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at least {min} characters (got {actual})")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("{field} must be a non-negative whole number (got '{value}')")]
    NotNumeric { field: &'static str, value: String },

    #[error("invalid date '{value}', expected DD/MM/YYYY HH:MM")]
    InvalidDate { value: String },

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("{field} is required")]
    Missing { field: &'static str },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trim `value` and check it is non-empty and at least `min_len` characters.
pub fn validate_text(field: &'static str, value: &str, min_len: usize) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    let actual = trimmed.chars().count();
    if actual < min_len {
        return Err(ValidationError::TooShort {
            field,
            min: min_len,
            actual,
        });
    }

    Ok(trimmed.to_string())
}

/// Parse an age typed by the user.
pub fn validate_age(value: &str) -> ValidationResult<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field: "age" });
    }
    trimmed.parse::<u32>().map_err(|_| ValidationError::NotNumeric {
        field: "age",
        value: trimmed.to_string(),
    })
}

/// Unwrap a mandatory argument or report which one is absent.
pub fn require<T>(field: &'static str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or(ValidationError::Missing { field })
}
