//! Interactive menu over a [`Registry`].

use std::fmt::Display;
use std::io::{BufRead, Write};

use vet_clinic_core::models::{
    format_appointment_time, parse_appointment_time, validate_age, validate_text, Client, ClientId,
    Pet, PetId, ServiceKind, Veterinarian, MIN_ADDRESS_LEN, MIN_CONTACT_LEN, MIN_NAME_LEN,
    MIN_PET_FIELD_LEN, MIN_SPECIALTY_LEN,
};
use vet_clinic_core::{AppointmentRequest, ClinicError, ClinicResult, ClinicStore, Registry};

use crate::prompt::{PromptError, PromptResult, Prompter};

/// How many fuzzy matches to offer when selecting a client.
const CLIENT_SEARCH_LIMIT: usize = 5;

/// The menu loop, owning the registry for the lifetime of the session.
pub struct ClinicApp<R, W> {
    registry: Registry,
    store: ClinicStore,
    prompter: Prompter<R, W>,
}

impl<R: BufRead, W: Write> ClinicApp<R, W> {
    pub fn new(registry: Registry, store: ClinicStore, prompter: Prompter<R, W>) -> Self {
        Self {
            registry,
            store,
            prompter,
        }
    }

    fn print_menu(&mut self) -> PromptResult<()> {
        let p = &mut self.prompter;
        p.say("")?;
        p.say("--- Main Menu ---")?;
        p.say("1. Register client")?;
        p.say("2. Register pet")?;
        p.say("3. Register veterinarian")?;
        p.say("4. Schedule appointment")?;
        p.say("5. View pet history")?;
        p.say("6. List clients")?;
        p.say("7. List veterinarians")?;
        p.say("8. Save")?;
        p.say("9. Exit")?;
        Ok(())
    }

    /// Run until the user exits or input ends, then save.
    pub fn run(&mut self) -> PromptResult<()> {
        loop {
            self.print_menu()?;
            let choice = match self.prompter.line("Choose an option") {
                Ok(choice) => choice,
                Err(PromptError::Eof) => break,
                Err(e) => return Err(e),
            };

            let result = match choice.as_str() {
                "1" => self.register_client(),
                "2" => self.register_pet(),
                "3" => self.register_veterinarian(),
                "4" => self.schedule_appointment(),
                "5" => self.view_history(),
                "6" => self.list_clients(),
                "7" => self.list_veterinarians(),
                "8" => self.save().map(|_| ()),
                "9" => break,
                other => self.prompter.say(format!("Invalid option '{}'", other)),
            };

            match result {
                Ok(()) => {}
                Err(PromptError::TooManyAttempts(n)) => {
                    self.prompter
                        .say(format!("Too many invalid answers ({}), operation cancelled", n))?;
                }
                Err(PromptError::Eof) => break,
                Err(e) => return Err(e),
            }
        }

        self.exit()
    }

    fn register_client(&mut self) -> PromptResult<()> {
        self.prompter.say("\n--- Register client ---")?;
        let name = self.ask_text("Name", "name", MIN_NAME_LEN)?;
        let contact = self.ask_text("Contact (phone/email)", "contact", MIN_CONTACT_LEN)?;
        let address = self.ask_text("Address", "address", MIN_ADDRESS_LEN)?;

        let result = Client::new(&name, &contact, &address)
            .map(|client| self.registry.add_client(client))
            .map_err(ClinicError::from);
        self.report(result, format!("Client {} registered", name))
    }

    fn register_pet(&mut self) -> PromptResult<()> {
        self.prompter.say("\n--- Register pet ---")?;
        let Some(owner) = self.select_client()? else {
            return Ok(());
        };

        let name = self.ask_text("Pet name", "name", MIN_NAME_LEN)?;
        let species = self.ask_text("Species", "species", MIN_PET_FIELD_LEN)?;
        let breed = self.ask_text("Breed", "breed", MIN_PET_FIELD_LEN)?;
        let age = self.prompter.ask("Age (years)", validate_age)?;

        let result = Pet::new(owner, &name, &species, &breed, age)
            .map_err(ClinicError::from)
            .and_then(|pet| Ok(self.registry.add_pet_to_client(owner, pet)?));
        self.report(result, format!("Pet {} registered", name))
    }

    fn register_veterinarian(&mut self) -> PromptResult<()> {
        self.prompter.say("\n--- Register veterinarian ---")?;
        let name = self.ask_text("Name", "name", MIN_NAME_LEN)?;
        let contact = self.ask_text("Contact (phone/email)", "contact", MIN_CONTACT_LEN)?;
        let address = self.ask_text("Address", "address", MIN_ADDRESS_LEN)?;
        let specialty = self.ask_text("Specialty", "specialty", MIN_SPECIALTY_LEN)?;

        let result = Veterinarian::new(&name, &contact, &address, &specialty)
            .map(|vet| self.registry.add_veterinarian(vet))
            .map_err(ClinicError::from);
        self.report(result, format!("Veterinarian {} registered", name))
    }

    fn schedule_appointment(&mut self) -> PromptResult<()> {
        self.prompter.say("\n--- Schedule appointment ---")?;
        if self.registry.veterinarians().is_empty() {
            return self.prompter.say("No veterinarians registered yet");
        }

        let mut request = AppointmentRequest::default();
        let Some(client) = self.select_client()? else {
            return Ok(());
        };
        request.pet = self.select_pet(client)?;
        if request.pet.is_none() {
            return Ok(());
        }

        let vets = self.registry.veterinarians().to_vec();
        request.veterinarian = self
            .prompter
            .choose("Veterinarian", &vets, |v| {
                format!("{} ({})", v.person.name, v.specialty)
            })?
            .map(|v| v.id);
        if request.veterinarian.is_none() {
            return Ok(());
        }

        request.when = Some(
            self.prompter
                .ask("Date and time (DD/MM/YYYY HH:MM)", parse_appointment_time)?,
        );
        request.service = self
            .prompter
            .choose("Service", &ServiceKind::ALL, |s| s.label().to_string())?
            .copied();

        let result = self.registry.schedule(request).map_err(ClinicError::from);
        self.report(result, "Appointment scheduled")
    }

    fn view_history(&mut self) -> PromptResult<()> {
        self.prompter.say("\n--- Pet history ---")?;
        let Some(client) = self.select_client()? else {
            return Ok(());
        };
        let Some(pet) = self.select_pet(client)? else {
            return Ok(());
        };

        let lines: Vec<String> = match self.registry.pet_history(pet) {
            Ok(history) if history.is_empty() => vec!["No appointments yet".to_string()],
            Ok(history) => history
                .iter()
                .map(|a| {
                    let vet = self
                        .registry
                        .veterinarian(a.veterinarian)
                        .map(|v| v.person.name.as_str())
                        .unwrap_or("?");
                    format!(
                        "  {} | {:<12} | {}",
                        format_appointment_time(&a.when),
                        a.service.label(),
                        vet
                    )
                })
                .collect(),
            Err(e) => vec![format!("Error: {}", e)],
        };

        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    fn list_clients(&mut self) -> PromptResult<()> {
        if self.registry.clients().is_empty() {
            return self.prompter.say("No clients registered yet");
        }

        let mut lines = vec![format!(
            "\n--- Clients ({}) ---",
            self.registry.clients().len()
        )];
        for client in self.registry.clients() {
            lines.push(format!(
                "{} | {} | {}",
                client.person.name, client.person.contact, client.person.address
            ));
            for pet in client.pets() {
                lines.push(format!(
                    "    - {} ({}, {}, {} years)",
                    pet.name, pet.species, pet.breed, pet.age
                ));
            }
        }

        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    fn list_veterinarians(&mut self) -> PromptResult<()> {
        if self.registry.veterinarians().is_empty() {
            return self.prompter.say("No veterinarians registered yet");
        }

        let lines: Vec<String> = self
            .registry
            .veterinarians()
            .iter()
            .map(|v| format!("{} | {} | {}", v.person.name, v.specialty, v.person.contact))
            .collect();
        self.prompter.say(format!("\n--- Veterinarians ({}) ---", lines.len()))?;
        for line in lines {
            self.prompter.say(line)?;
        }
        Ok(())
    }

    /// Save, reporting the outcome; `Ok(false)` if the write failed.
    fn save(&mut self) -> PromptResult<bool> {
        match self.registry.save(&self.store) {
            Ok(report) => {
                for diagnostic in &report.diagnostics {
                    self.prompter.say(format!("  skipped {}", diagnostic))?;
                }
                self.prompter.say(format!(
                    "Saved {} clients, {} pets, {} veterinarians, {} appointments to {}",
                    report.clients,
                    report.pets,
                    report.veterinarians,
                    report.appointments,
                    self.store.path().display()
                ))?;
                Ok(true)
            }
            Err(e) => {
                tracing::error!(error = %e, "save failed");
                self.prompter.say(format!("Save failed: {}", e))?;
                Ok(false)
            }
        }
    }

    /// Final save; a failed write may be retried while the user agrees.
    fn exit(&mut self) -> PromptResult<()> {
        loop {
            if self.save()? {
                break;
            }
            match self.prompter.confirm("Retry saving") {
                Ok(true) => continue,
                Ok(false) | Err(PromptError::Eof) | Err(PromptError::TooManyAttempts(_)) => {
                    self.prompter.say("Exiting without saving")?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        self.prompter.say("Goodbye!")
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Print `success` or the error of a core operation.
    fn report<T>(&mut self, result: ClinicResult<T>, success: impl Display) -> PromptResult<()> {
        match result {
            Ok(_) => self.prompter.say(success),
            Err(e) => {
                tracing::warn!(error = %e, "operation rejected");
                self.prompter.say(format!("Error: {}", e))
            }
        }
    }

    fn ask_text(&mut self, prompt: &str, field: &'static str, min_len: usize) -> PromptResult<String> {
        self.prompter
            .ask(prompt, |answer| validate_text(field, answer, min_len))
    }

    /// Pick a client, narrowing by name first when there are several.
    fn select_client(&mut self) -> PromptResult<Option<ClientId>> {
        if self.registry.clients().is_empty() {
            self.prompter.say("No clients registered yet")?;
            return Ok(None);
        }

        let query = self.prompter.line("Client name (empty to list all)")?;
        let candidates: Vec<(ClientId, String)> = if query.is_empty() {
            self.registry
                .clients()
                .iter()
                .map(|c| (c.id, client_label(c)))
                .collect()
        } else {
            self.registry
                .search_clients(&query, CLIENT_SEARCH_LIMIT)
                .into_iter()
                .map(|m| (m.client.id, client_label(m.client)))
                .collect()
        };

        if candidates.is_empty() {
            self.prompter.say(format!("No client matches '{}'", query))?;
            return Ok(None);
        }

        Ok(self
            .prompter
            .choose("Client", &candidates, |(_, label)| label.clone())?
            .map(|(id, _)| *id))
    }

    fn select_pet(&mut self, client: ClientId) -> PromptResult<Option<PetId>> {
        let pets: Vec<(PetId, String)> = self
            .registry
            .client(client)
            .map(|c| {
                c.pets()
                    .iter()
                    .map(|p| (p.id, format!("{} ({})", p.name, p.species)))
                    .collect()
            })
            .unwrap_or_default();

        if pets.is_empty() {
            self.prompter.say("This client has no pets")?;
            return Ok(None);
        }

        Ok(self
            .prompter
            .choose("Pet", &pets, |(_, label)| label.clone())?
            .map(|(id, _)| *id))
    }
}

fn client_label(client: &Client) -> String {
    format!("{} ({})", client.person.name, client.person.contact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;
    use vet_clinic_core::models::VetId;

    fn run_script(store: &ClinicStore, registry: Registry, script: &str) -> (Registry, String) {
        let prompter = Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new(), 3);
        let mut app = ClinicApp::new(registry, store.clone(), prompter);
        app.run().unwrap();
        let ClinicApp {
            registry, prompter, ..
        } = app;
        (registry, String::from_utf8(prompter.into_output()).unwrap())
    }

    #[test]
    fn test_full_session_persists() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("clinic.json"));

        let script = [
            // register client
            "1", "Maria Lopez", "555-0100", "123 Oak St",
            // register pet: select client by name, pick first match
            "2", "maria", "1", "Rex", "Dog", "Labrador", "3",
            // register vet
            "3", "Dr. Smith", "555-0199", "1 Clinic Rd", "Surgery",
            // schedule: client, pet, vet, date, service
            "4", "", "1", "1", "1", "15/03/2025 10:30", "2",
            // exit
            "9",
        ]
        .join("\n")
            + "\n";

        let (registry, output) = run_script(&store, Registry::new(), &script);
        assert!(output.contains("Appointment scheduled"), "{}", output);
        assert!(output.contains("Goodbye!"));
        assert!(!registry.has_unsaved_changes());

        let (loaded, _) = Registry::load(&store).unwrap();
        let rex = loaded.find_pet_by_names("Rex", "Maria Lopez").unwrap();
        let history = loaded.pet_history(rex.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].service, ServiceKind::Vaccination);
    }

    #[test]
    fn test_invalid_answers_cancel_operation() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("clinic.json"));

        let script = "1\nAl\nBo\n\n9\n";
        let (registry, output) = run_script(&store, Registry::new(), script);

        assert!(output.contains("operation cancelled"), "{}", output);
        assert!(registry.clients().is_empty());
    }

    #[test]
    fn test_end_of_input_still_saves() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("clinic.json"));

        let script = "3\nDr. Smith\n555-0199\n1 Clinic Rd\nSurgery\n";
        run_script(&store, Registry::new(), script);

        let (loaded, _) = Registry::load(&store).unwrap();
        assert_eq!(loaded.veterinarians().len(), 1);
    }

    #[test]
    fn test_core_errors_are_reported() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("clinic.json"));
        let prompter = Prompter::new(Cursor::new(Vec::new()), Vec::new(), 3);
        let mut app = ClinicApp::new(Registry::new(), store, prompter);

        let result = app
            .registry
            .schedule_appointment(
                PetId::new(),
                VetId::new(),
                ServiceKind::Surgery,
                parse_appointment_time("15/03/2025 10:30").unwrap(),
            )
            .map_err(ClinicError::from);
        app.report(result, "Appointment scheduled").unwrap();

        let output = String::from_utf8(app.prompter.into_output()).unwrap();
        assert!(output.starts_with("Error: Not found:"), "{}", output);
        assert!(app.registry.appointments().is_empty());
    }

    #[test]
    fn test_schedule_without_vets_is_refused() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("clinic.json"));

        let (_, output) = run_script(&store, Registry::new(), "4\n9\n");
        assert!(output.contains("No veterinarians registered yet"));
    }
}
