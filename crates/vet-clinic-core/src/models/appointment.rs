//! Appointment records and the fixed date format they are stored with.

use chrono::{NaiveDateTime, Timelike};

use super::ids::{AppointmentId, PetId, VetId};
use super::service::ServiceKind;
use super::validation::{require, ValidationError, ValidationResult};
use crate::registry::{ReferenceError, Registry};
use crate::store::{AppointmentDoc, DeserializationError, RecordKind};

/// `DD/MM/YYYY HH:MM`, 24-hour clock.
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Parse a date-time typed by the user or read from the store.
pub fn parse_appointment_time(value: &str) -> ValidationResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ValidationError::InvalidDate {
            value: value.to_string(),
        }
    })
}

pub fn format_appointment_time(when: &NaiveDateTime) -> String {
    when.format(DATE_FORMAT).to_string()
}

/// A booked visit of one pet to one veterinarian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub pet: PetId,
    pub veterinarian: VetId,
    pub service: ServiceKind,
    pub when: NaiveDateTime,
}

/// Appointment fields as collected from the user, any of which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub pet: Option<PetId>,
    pub veterinarian: Option<VetId>,
    pub service: Option<ServiceKind>,
    pub when: Option<NaiveDateTime>,
}

/// Drop seconds and below; the store keeps minutes only.
pub fn truncate_to_minute(when: NaiveDateTime) -> NaiveDateTime {
    when.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(when)
}

impl Appointment {
    /// `when` is truncated to the minute.
    pub fn new(pet: PetId, veterinarian: VetId, service: ServiceKind, when: NaiveDateTime) -> Self {
        Self {
            id: AppointmentId::new(),
            pet,
            veterinarian,
            service,
            when: truncate_to_minute(when),
        }
    }

    /// Build from a request, failing on the first absent field.
    pub fn from_request(request: AppointmentRequest) -> ValidationResult<Self> {
        Ok(Self::new(
            require("pet", request.pet)?,
            require("veterinarian", request.veterinarian)?,
            require("service", request.service)?,
            require("date", request.when)?,
        ))
    }

    /// Document form, with the pet, owner and veterinarian names filled in
    /// from `context`.
    pub fn to_document(&self, context: &Registry) -> Result<AppointmentDoc, ReferenceError> {
        let pet = context
            .pet(self.pet)
            .ok_or(ReferenceError::UnknownPet(self.pet))?;
        let owner = context
            .client(pet.owner())
            .ok_or(ReferenceError::UnknownClient(pet.owner()))?;
        let vet = context
            .veterinarian(self.veterinarian)
            .ok_or(ReferenceError::UnknownVeterinarian(self.veterinarian))?;

        Ok(AppointmentDoc {
            id: Some(self.id),
            pet_id: Some(pet.id),
            owner_id: Some(owner.id),
            veterinarian_id: Some(vet.id),
            pet: Some(pet.name.clone()),
            owner: Some(owner.person.name.clone()),
            veterinarian: Some(vet.person.name.clone()),
            service: self.service.label().to_string(),
            date: format_appointment_time(&self.when),
        })
    }

    /// Rebuild an appointment, resolving its references against `context`.
    ///
    /// `nested_in` is the pet whose history the document was found in; it
    /// takes precedence over whatever pet the document names.
    pub fn from_document(
        doc: &AppointmentDoc,
        context: &Registry,
        nested_in: Option<PetId>,
    ) -> Result<Self, DeserializationError> {
        let service = ServiceKind::from_label(&doc.service)
            .map_err(DeserializationError::invalid(RecordKind::Appointment))?;
        let when = parse_appointment_time(&doc.date)
            .map_err(DeserializationError::invalid(RecordKind::Appointment))?;

        let pet = match nested_in {
            Some(pet) => pet,
            None => resolve_pet(doc, context)?,
        };
        let veterinarian = resolve_veterinarian(doc, context)?;

        let mut appointment = Self::new(pet, veterinarian, service, when);
        if let Some(id) = doc.id {
            appointment.id = id;
        }
        Ok(appointment)
    }

    /// Same booking, ignoring the id.
    pub fn same_booking(&self, other: &Appointment) -> bool {
        self.pet == other.pet
            && self.veterinarian == other.veterinarian
            && self.service == other.service
            && self.when == other.when
    }
}

fn unresolved(target: RecordKind, key: String) -> DeserializationError {
    DeserializationError::Unresolved {
        record: RecordKind::Appointment,
        target,
        key,
    }
}

fn resolve_pet(doc: &AppointmentDoc, context: &Registry) -> Result<PetId, DeserializationError> {
    if let Some(id) = doc.pet_id {
        return context
            .pet(id)
            .map(|p| p.id)
            .ok_or_else(|| unresolved(RecordKind::Pet, id.to_string()));
    }

    match (&doc.pet, &doc.owner) {
        (Some(pet), Some(owner)) => {
            tracing::warn!(pet = %pet, owner = %owner, "appointment has no pet id, matching by name");
            context
                .find_pet_by_names(pet, owner)
                .map(|p| p.id)
                .ok_or_else(|| unresolved(RecordKind::Pet, format!("{} (owner {})", pet, owner)))
        }
        _ => Err(unresolved(RecordKind::Pet, "<none>".to_string())),
    }
}

fn resolve_veterinarian(
    doc: &AppointmentDoc,
    context: &Registry,
) -> Result<VetId, DeserializationError> {
    if let Some(id) = doc.veterinarian_id {
        return context
            .veterinarian(id)
            .map(|v| v.id)
            .ok_or_else(|| unresolved(RecordKind::Veterinarian, id.to_string()));
    }

    match &doc.veterinarian {
        Some(name) => {
            tracing::warn!(veterinarian = %name, "appointment has no veterinarian id, matching by name");
            context
                .find_veterinarian_by_name(name)
                .map(|v| v.id)
                .ok_or_else(|| unresolved(RecordKind::Veterinarian, name.clone()))
        }
        None => Err(unresolved(RecordKind::Veterinarian, "<none>".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_appointment_time() {
        assert_eq!(parse_appointment_time("15/03/2025 10:30"), Ok(when()));
        assert_eq!(format_appointment_time(&when()), "15/03/2025 10:30");
    }

    #[test]
    fn test_new_drops_seconds() {
        let precise = when().with_second(45).unwrap().with_nanosecond(123).unwrap();
        let appointment = Appointment::new(PetId::new(), VetId::new(), ServiceKind::Surgery, precise);
        assert_eq!(appointment.when, when());
    }

    #[test]
    fn test_format_is_zero_padded() {
        let early = NaiveDate::from_ymd_opt(2025, 1, 5)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        assert_eq!(format_appointment_time(&early), "05/01/2025 07:05");
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        for bad in ["2025-03-15 10:30", "15/03/2025", "31/02/2025 10:00", "15/03/2025 25:00", ""] {
            assert!(
                matches!(parse_appointment_time(bad), Err(ValidationError::InvalidDate { .. })),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_from_request_requires_every_field() {
        let full = AppointmentRequest {
            pet: Some(PetId::new()),
            veterinarian: Some(VetId::new()),
            service: Some(ServiceKind::Vaccination),
            when: Some(when()),
        };
        assert!(Appointment::from_request(full.clone()).is_ok());

        let cases = [
            ("pet", AppointmentRequest { pet: None, ..full.clone() }),
            ("veterinarian", AppointmentRequest { veterinarian: None, ..full.clone() }),
            ("service", AppointmentRequest { service: None, ..full.clone() }),
            ("date", AppointmentRequest { when: None, ..full.clone() }),
        ];
        for (field, request) in cases {
            assert_eq!(
                Appointment::from_request(request),
                Err(ValidationError::Missing { field })
            );
        }
    }

    proptest! {
        #[test]
        fn prop_date_format_round_trips(
            days in 0i64..36_500,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
            let dt = base.and_hms_opt(hour, minute, 0).unwrap();
            let text = format_appointment_time(&dt);
            prop_assert_eq!(text.len(), 16);
            let back = parse_appointment_time(&text).unwrap();
            prop_assert_eq!(back, dt);
            prop_assert_eq!(back.minute(), minute);
        }
    }
}
