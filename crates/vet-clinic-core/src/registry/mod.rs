//! The clinic registry: the authoritative in-memory store of every entity.
//!
//! A [`Registry`] is an ordinary value. The front end creates one (usually via
//! [`Registry::load`]), passes it around by reference, and saves it on exit.

mod search;

pub use search::*;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{
    find_by_name, Appointment, AppointmentId, AppointmentRequest, Client, ClientId, Pet, PetId,
    ServiceKind, ValidationError, VetId, Veterinarian,
};

/// An operation named an entity the registry does not know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    #[error("unknown pet {0}")]
    UnknownPet(PetId),

    #[error("unknown veterinarian {0}")]
    UnknownVeterinarian(VetId),

    #[error("unknown appointment {0}")]
    UnknownAppointment(AppointmentId),
}

/// Registry mutation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Where the registry stands relative to the store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// Never loaded from or saved to a store
    Unloaded,
    /// Loaded (fully or partially), or modified since the last save
    Loaded,
    /// Matches what was last written to the store
    Persisted,
}

/// Clients (with their pets), veterinarians and appointments.
#[derive(Debug, Clone)]
pub struct Registry {
    clients: Vec<Client>,
    veterinarians: Vec<Veterinarian>,
    appointments: Vec<Appointment>,
    state: RegistryState,
    dirty: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty, unloaded registry.
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
            veterinarians: Vec::new(),
            appointments: Vec::new(),
            state: RegistryState::Unloaded,
            dirty: false,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Register a client. Names are not checked for uniqueness.
    pub fn add_client(&mut self, client: Client) -> ClientId {
        let id = client.id;
        self.clients.push(client);
        self.touch();
        id
    }

    /// Register a veterinarian. Names are not checked for uniqueness.
    pub fn add_veterinarian(&mut self, veterinarian: Veterinarian) -> VetId {
        let id = veterinarian.id;
        self.veterinarians.push(veterinarian);
        self.touch();
        id
    }

    /// Make `client` the owner of `pet`.
    ///
    /// Adding a pet the client already owns changes nothing. A pet currently
    /// owned by another client is moved, keeping its history.
    pub fn add_pet_to_client(&mut self, client: ClientId, pet: Pet) -> RegistryResult<PetId> {
        let pet_id = pet.id;
        let target = self.client_index(client)?;

        let pet = match self.pet(pet_id).map(Pet::owner) {
            Some(owner) if owner == client => return Ok(pet_id),
            Some(owner) => {
                let moved = self
                    .clients
                    .iter_mut()
                    .find(|c| c.id == owner)
                    .and_then(|c| c.detach_pet(pet_id));
                tracing::info!(pet = %pet_id, from = %owner, to = %client, "moving pet to new owner");
                moved.unwrap_or(pet)
            }
            None => pet,
        };

        self.clients[target].attach_pet(pet);
        self.touch();
        Ok(pet_id)
    }

    /// Book an appointment from possibly-incomplete input.
    ///
    /// On any error neither the pet's history nor the appointment list changes.
    pub fn schedule(&mut self, request: AppointmentRequest) -> RegistryResult<AppointmentId> {
        let appointment = Appointment::from_request(request)?;

        if self.veterinarian(appointment.veterinarian).is_none() {
            return Err(ReferenceError::UnknownVeterinarian(appointment.veterinarian).into());
        }
        let pet = self
            .pet_mut(appointment.pet)
            .ok_or(ReferenceError::UnknownPet(appointment.pet))?;

        let id = appointment.id;
        pet.push_history(id);
        self.appointments.push(appointment);
        self.touch();
        Ok(id)
    }

    /// Book an appointment for `pet` with `veterinarian`.
    pub fn schedule_appointment(
        &mut self,
        pet: PetId,
        veterinarian: VetId,
        service: ServiceKind,
        when: NaiveDateTime,
    ) -> RegistryResult<AppointmentId> {
        self.schedule(AppointmentRequest {
            pet: Some(pet),
            veterinarian: Some(veterinarian),
            service: Some(service),
            when: Some(when),
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn veterinarians(&self) -> &[Veterinarian] {
        &self.veterinarians
    }

    /// Every appointment, in booking order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn veterinarian(&self, id: VetId) -> Option<&Veterinarian> {
        self.veterinarians.iter().find(|v| v.id == id)
    }

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn pet(&self, id: PetId) -> Option<&Pet> {
        self.clients.iter().find_map(|c| c.pet(id))
    }

    pub fn pet_count(&self) -> usize {
        self.clients.iter().map(|c| c.pets().len()).sum()
    }

    /// A pet's appointments, oldest first.
    pub fn pet_history(&self, pet: PetId) -> Result<Vec<&Appointment>, ReferenceError> {
        let pet = self.pet(pet).ok_or(ReferenceError::UnknownPet(pet))?;
        Ok(pet
            .history()
            .iter()
            .filter_map(|id| self.appointment(*id))
            .collect())
    }

    /// First client with exactly this name.
    pub fn find_client_by_name(&self, name: &str) -> Option<&Client> {
        find_by_name(&self.clients, name)
    }

    /// First veterinarian with exactly this name.
    pub fn find_veterinarian_by_name(&self, name: &str) -> Option<&Veterinarian> {
        find_by_name(&self.veterinarians, name)
    }

    /// First pet named `pet` among the clients named `owner`.
    pub fn find_pet_by_names(&self, pet: &str, owner: &str) -> Option<&Pet> {
        self.clients
            .iter()
            .filter(|c| c.person.name == owner)
            .find_map(|c| find_by_name(c.pets(), pet))
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// True when something changed since the last load or save.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.veterinarians.is_empty() && self.appointments.is_empty()
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.state = RegistryState::Loaded;
        self.dirty = false;
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.state = RegistryState::Persisted;
        self.dirty = false;
    }

    fn touch(&mut self) {
        self.dirty = true;
        if self.state == RegistryState::Persisted {
            self.state = RegistryState::Loaded;
        }
    }

    // =========================================================================
    // Restoration (used while decoding a store document)
    // =========================================================================

    /// Insert a decoded veterinarian; `false` if the id is taken.
    pub(crate) fn restore_veterinarian(&mut self, veterinarian: Veterinarian) -> bool {
        if self.veterinarian(veterinarian.id).is_some() {
            return false;
        }
        self.veterinarians.push(veterinarian);
        true
    }

    /// Insert a decoded client; `false` if the id is taken.
    pub(crate) fn restore_client(&mut self, client: Client) -> bool {
        if self.client(client.id).is_some() {
            return false;
        }
        self.clients.push(client);
        true
    }

    /// Attach a decoded pet to an already restored client; `false` if the
    /// pet id is taken or the client is missing.
    pub(crate) fn restore_pet(&mut self, client: ClientId, pet: Pet) -> bool {
        if self.pet(pet.id).is_some() {
            return false;
        }
        match self.clients.iter_mut().find(|c| c.id == client) {
            Some(owner) => owner.attach_pet(pet),
            None => false,
        }
    }

    /// Append a decoded appointment to its pet's history and the global list;
    /// `false` if the id is taken or the pet is missing.
    pub(crate) fn restore_appointment(&mut self, appointment: Appointment) -> bool {
        if self.appointment(appointment.id).is_some() {
            return false;
        }
        match self.pet_mut(appointment.pet) {
            Some(pet) => pet.push_history(appointment.id),
            None => return false,
        }
        self.appointments.push(appointment);
        true
    }

    fn client_index(&self, id: ClientId) -> Result<usize, ReferenceError> {
        self.clients
            .iter()
            .position(|c| c.id == id)
            .ok_or(ReferenceError::UnknownClient(id))
    }

    fn pet_mut(&mut self, id: PetId) -> Option<&mut Pet> {
        self.clients.iter_mut().find_map(|c| c.pet_mut(id))
    }
}
