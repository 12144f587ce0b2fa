//! Conversion between a [`Registry`] and the store document.
//!
//! Decoding runs in dependency order: veterinarians, then clients with their
//! pets and each pet's history, then the flat appointment list. A record that
//! fails is reported and skipped; everything else still loads.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::document::{
    AppointmentDoc, ClientHeader, ClinicDocument, DeserializationError, Diagnostic, PetHeader,
    RecordKind, VetDoc,
};
use crate::models::{Appointment, AppointmentId, Client, ClientId, Pet, PetId, Veterinarian};
use crate::registry::{ReferenceError, Registry};

pub type LoadDiagnostic = Diagnostic<DeserializationError>;
pub type SaveDiagnostic = Diagnostic<ReferenceError>;

/// Top level of the store file with every record still undecoded.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub veterinarians: Vec<Value>,
    #[serde(default)]
    pub clients: Vec<Value>,
    #[serde(default)]
    pub appointments: Vec<Value>,
}

// =========================================================================
// Encoding
// =========================================================================

/// Build the document for `registry`, skipping records with dangling references.
pub fn encode(registry: &Registry) -> (ClinicDocument, Vec<SaveDiagnostic>) {
    let mut diagnostics = Vec::new();

    let veterinarians = registry
        .veterinarians()
        .iter()
        .map(Veterinarian::to_document)
        .collect();

    let mut clients = Vec::with_capacity(registry.clients().len());
    for (ci, client) in registry.clients().iter().enumerate() {
        let mut mascotas = Vec::with_capacity(client.pets().len());
        for (pi, pet) in client.pets().iter().enumerate() {
            let mut historial = Vec::with_capacity(pet.history().len());
            for (hi, id) in pet.history().iter().enumerate() {
                let doc = registry
                    .appointment(*id)
                    .ok_or(ReferenceError::UnknownAppointment(*id))
                    .and_then(|a| a.to_document(registry));
                match doc {
                    Ok(doc) => historial.push(doc),
                    Err(error) => skip(
                        &mut diagnostics,
                        format!("clients[{}].mascotas[{}].historial[{}]", ci, pi, hi),
                        error,
                    ),
                }
            }
            mascotas.push(pet.to_document(historial));
        }
        clients.push(client.to_document(mascotas));
    }

    let mut appointments = Vec::with_capacity(registry.appointments().len());
    for (i, appointment) in registry.appointments().iter().enumerate() {
        match appointment.to_document(registry) {
            Ok(doc) => appointments.push(doc),
            Err(error) => skip(&mut diagnostics, format!("appointments[{}]", i), error),
        }
    }

    (
        ClinicDocument {
            veterinarians,
            clients,
            appointments,
        },
        diagnostics,
    )
}

// =========================================================================
// Decoding
// =========================================================================

/// Rebuild a registry from a raw document.
pub(crate) fn decode(raw: &RawDocument) -> (Registry, Vec<LoadDiagnostic>) {
    let mut registry = Registry::new();
    let mut diagnostics = Vec::new();

    for (i, value) in raw.veterinarians.iter().enumerate() {
        let location = format!("veterinarians[{}]", i);
        let vet = parse::<VetDoc>(value, RecordKind::Veterinarian)
            .and_then(Veterinarian::from_document);
        match vet {
            Ok(vet) => {
                let id = vet.id;
                if !registry.restore_veterinarian(vet) {
                    skip(&mut diagnostics, location, duplicate(RecordKind::Veterinarian, id));
                }
            }
            Err(error) => skip(&mut diagnostics, location, error),
        }
    }

    for (ci, value) in raw.clients.iter().enumerate() {
        let location = format!("clients[{}]", ci);
        let client = match parse::<ClientHeader>(value, RecordKind::Client)
            .and_then(Client::from_document)
        {
            Ok(client) => client,
            Err(error) => {
                skip(&mut diagnostics, location, error);
                continue;
            }
        };

        let client_id = client.id;
        if !registry.restore_client(client) {
            skip(&mut diagnostics, location, duplicate(RecordKind::Client, client_id));
            continue;
        }

        match children(value, "mascotas", RecordKind::Pet) {
            Ok(pets) => {
                for (pi, pet) in pets.iter().enumerate() {
                    let location = format!("{}.mascotas[{}]", location, pi);
                    decode_pet(&mut registry, &mut diagnostics, client_id, pet, &location);
                }
            }
            Err(error) => skip(&mut diagnostics, format!("{}.mascotas", location), error),
        }
    }

    let mut unmatched: HashSet<AppointmentId> =
        registry.appointments().iter().map(|a| a.id).collect();
    for (i, value) in raw.appointments.iter().enumerate() {
        let location = format!("appointments[{}]", i);
        if let Err(error) = reconcile_flat_appointment(&mut registry, &mut unmatched, value) {
            skip(&mut diagnostics, location, error);
        }
    }

    (registry, diagnostics)
}

fn decode_pet(
    registry: &mut Registry,
    diagnostics: &mut Vec<LoadDiagnostic>,
    owner: ClientId,
    value: &Value,
    location: &str,
) {
    let pet = match parse::<PetHeader>(value, RecordKind::Pet)
        .and_then(|header| Pet::from_document(header, owner))
    {
        Ok(pet) => pet,
        Err(error) => {
            skip(diagnostics, location.to_string(), error);
            return;
        }
    };

    let pet_id = pet.id;
    if !registry.restore_pet(owner, pet) {
        skip(diagnostics, location.to_string(), duplicate(RecordKind::Pet, pet_id));
        return;
    }

    let history = match children(value, "historial", RecordKind::Appointment) {
        Ok(history) => history,
        Err(error) => {
            skip(diagnostics, format!("{}.historial", location), error);
            return;
        }
    };

    for (hi, entry) in history.iter().enumerate() {
        let location = format!("{}.historial[{}]", location, hi);
        if let Err(error) = decode_nested_appointment(registry, pet_id, entry) {
            skip(diagnostics, location, error);
        }
    }
}

/// Appointments nested under a pet belong to that pet, whatever they say.
fn decode_nested_appointment(
    registry: &mut Registry,
    pet: PetId,
    value: &Value,
) -> Result<(), DeserializationError> {
    let doc = parse::<AppointmentDoc>(value, RecordKind::Appointment)?;
    let appointment = Appointment::from_document(&doc, registry, Some(pet))?;
    let id = appointment.id;
    if registry.restore_appointment(appointment) {
        Ok(())
    } else {
        Err(duplicate(RecordKind::Appointment, id))
    }
}

/// Match a flat-list entry against the already-loaded pet histories.
///
/// `unmatched` holds the nested appointments no flat entry has claimed yet;
/// each one absorbs at most one flat copy. Entries with an id must agree with
/// the pet copy, which wins on conflict. Entries without an id pair up with an
/// unclaimed nested booking that has the same pet, veterinarian, service and
/// time. Anything left over is a booking of its own and is attached to its pet,
/// so repeated identical bookings are all kept.
fn reconcile_flat_appointment(
    registry: &mut Registry,
    unmatched: &mut HashSet<AppointmentId>,
    value: &Value,
) -> Result<(), DeserializationError> {
    let doc = parse::<AppointmentDoc>(value, RecordKind::Appointment)?;

    if let Some(existing) = doc.id.and_then(|id| registry.appointment(id)) {
        let flat = Appointment::from_document(&doc, registry, None)?;
        unmatched.remove(&existing.id);
        return if flat.same_booking(existing) {
            Ok(())
        } else {
            Err(DeserializationError::Conflict { id: existing.id })
        };
    }

    let appointment = Appointment::from_document(&doc, registry, None)?;

    if doc.id.is_none() {
        let twin = registry.pet_history(appointment.pet).ok().and_then(|history| {
            history
                .iter()
                .find(|a| unmatched.contains(&a.id) && a.same_booking(&appointment))
                .map(|a| a.id)
        });
        if let Some(twin) = twin {
            unmatched.remove(&twin);
            return Ok(());
        }
    }

    let id = appointment.id;
    if registry.restore_appointment(appointment) {
        Ok(())
    } else {
        Err(duplicate(RecordKind::Appointment, id))
    }
}

fn parse<T: DeserializeOwned>(value: &Value, record: RecordKind) -> Result<T, DeserializationError> {
    T::deserialize(value).map_err(|source| DeserializationError::Malformed { record, source })
}

/// Nested records under `key`; a missing key means none.
fn children(value: &Value, key: &str, record: RecordKind) -> Result<Vec<Value>, DeserializationError> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(nested) => parse::<Vec<Value>>(nested, record),
    }
}

fn duplicate(record: RecordKind, id: impl ToString) -> DeserializationError {
    DeserializationError::DuplicateId {
        record,
        id: id.to_string(),
    }
}

fn skip<E: std::fmt::Display>(diagnostics: &mut Vec<Diagnostic<E>>, location: String, error: E) {
    tracing::warn!(%location, %error, "skipping record");
    diagnostics.push(Diagnostic { location, error });
}
