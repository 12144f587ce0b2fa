//! The fixed catalogue of services the clinic offers.

use std::fmt;
use std::str::FromStr;

use super::validation::ValidationError;

/// A service an appointment can be booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Consultation,
    Vaccination,
    Surgery,
    Grooming,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Consultation,
        ServiceKind::Vaccination,
        ServiceKind::Surgery,
        ServiceKind::Grooming,
    ];

    /// Display label, also used as the stored value.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Consultation => "Consultation",
            ServiceKind::Vaccination => "Vaccination",
            ServiceKind::Surgery => "Surgery",
            ServiceKind::Grooming => "Grooming",
        }
    }

    /// Parse a label (case-insensitive).
    pub fn from_label(value: &str) -> Result<Self, ValidationError> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownService(value.to_string()))
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}
