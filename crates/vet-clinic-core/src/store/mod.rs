//! JSON store file for the registry.
//!
//! Writes go through a `.tmp` sibling that is renamed into place, after the
//! previous file has been copied verbatim to a `.backup` sibling.

mod codec;
mod document;

pub use codec::{encode, LoadDiagnostic, SaveDiagnostic};
pub use document::*;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::StoreConfig;
use crate::registry::Registry;
use codec::{decode, RawDocument};

/// Store file errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read store {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store {} is not a valid clinic document: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to back up {} to {}: {source}", .path.display(), .backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write store {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode store document: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Location and write policy of the store file.
#[derive(Debug, Clone)]
pub struct ClinicStore {
    path: PathBuf,
    backup: bool,
}

impl ClinicStore {
    /// Store at `path`, keeping a backup of the previous version on save.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            backup: true,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.path).with_backup(config.backup)
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<store>.backup`
    pub fn backup_path(&self) -> PathBuf {
        self.sibling(".backup")
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("clinic.json"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Read the raw document; `None` if the file does not exist.
    pub(crate) fn read_raw(&self) -> StorageResult<Option<RawDocument>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        // Invalid UTF-8 surfaces as a parse error
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the store file with `document`, pretty-printed.
    ///
    /// If the backup copy cannot be made nothing is written.
    pub fn write_document(&self, document: &ClinicDocument) -> StorageResult<()> {
        let mut content = serde_json::to_string_pretty(document)?;
        content.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
            }
        }

        if self.backup && self.path.exists() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|source| StorageError::Backup {
                path: self.path.clone(),
                backup: backup.clone(),
                source,
            })?;
            tracing::debug!(backup = %backup.display(), "backed up previous store");
        }

        let temp = self.temp_path();
        fs::write(&temp, content).map_err(|source| self.write_error(source))?;
        if let Err(source) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(self.write_error(source));
        }
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// How the store file looked when it was loaded.
#[derive(Debug)]
pub enum LoadOutcome {
    /// No store file yet; the registry starts empty
    Missing,
    /// The file was read; see the diagnostics for skipped records
    Loaded,
    /// The file could not be parsed; the registry starts empty
    Corrupt(StorageError),
}

/// Result of [`Registry::load`].
#[derive(Debug)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    /// Records that were skipped
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadReport {
    /// True if every stored record made it into the registry.
    pub fn is_complete(&self) -> bool {
        !matches!(self.outcome, LoadOutcome::Corrupt(_)) && self.diagnostics.is_empty()
    }
}

/// Result of [`Registry::save`].
#[derive(Debug)]
pub struct SaveReport {
    pub veterinarians: usize,
    pub clients: usize,
    pub pets: usize,
    pub appointments: usize,
    /// Records left out of the file
    pub diagnostics: Vec<SaveDiagnostic>,
}

impl Registry {
    /// Load a registry from `store`.
    ///
    /// A missing file or one that is not valid JSON yields an empty registry;
    /// only an unreadable file is an error.
    pub fn load(store: &ClinicStore) -> StorageResult<(Registry, LoadReport)> {
        let (mut registry, report) = match store.read_raw() {
            Ok(None) => {
                tracing::info!(path = %store.path().display(), "no store file, starting empty");
                (
                    Registry::new(),
                    LoadReport {
                        outcome: LoadOutcome::Missing,
                        diagnostics: Vec::new(),
                    },
                )
            }
            Ok(Some(raw)) => {
                let (registry, diagnostics) = decode(&raw);
                tracing::info!(
                    path = %store.path().display(),
                    veterinarians = registry.veterinarians().len(),
                    clients = registry.clients().len(),
                    pets = registry.pet_count(),
                    appointments = registry.appointments().len(),
                    skipped = diagnostics.len(),
                    "loaded store"
                );
                (
                    registry,
                    LoadReport {
                        outcome: LoadOutcome::Loaded,
                        diagnostics,
                    },
                )
            }
            Err(error @ StorageError::Corrupt { .. }) => {
                tracing::error!(%error, "store is corrupt, starting empty");
                (
                    Registry::new(),
                    LoadReport {
                        outcome: LoadOutcome::Corrupt(error),
                        diagnostics: Vec::new(),
                    },
                )
            }
            Err(error) => return Err(error),
        };

        registry.mark_loaded();
        Ok((registry, report))
    }

    /// Replace this registry's contents with what `store` holds.
    pub fn reload(&mut self, store: &ClinicStore) -> StorageResult<LoadReport> {
        let (registry, report) = Registry::load(store)?;
        *self = registry;
        Ok(report)
    }

    /// Write the registry to `store`.
    ///
    /// Records with dangling references are left out and reported. On error
    /// the registry is untouched and the save can be retried.
    pub fn save(&mut self, store: &ClinicStore) -> StorageResult<SaveReport> {
        let (document, diagnostics) = encode(self);
        store.write_document(&document)?;

        let report = SaveReport {
            veterinarians: document.veterinarians.len(),
            clients: document.clients.len(),
            pets: document.clients.iter().map(|c| c.mascotas.len()).sum(),
            appointments: document.appointments.len(),
            diagnostics,
        };
        tracing::info!(
            path = %store.path().display(),
            clients = report.clients,
            appointments = report.appointments,
            skipped = report.diagnostics.len(),
            "saved store"
        );

        self.mark_persisted();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Client;
    use tempfile::tempdir;

    #[test]
    fn test_sibling_paths() {
        let store = ClinicStore::new("/data/clinic.json");
        assert_eq!(store.backup_path(), PathBuf::from("/data/clinic.json.backup"));
        assert_eq!(store.temp_path(), PathBuf::from("/data/clinic.json.tmp"));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("clinic.json"));

        let (registry, report) = Registry::load(&store).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(report.outcome, LoadOutcome::Missing));
        assert!(report.is_complete());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clinic.json");
        fs::write(&path, "{ not json").unwrap();

        let (registry, report) = Registry::load(&ClinicStore::new(&path)).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(report.outcome, LoadOutcome::Corrupt(StorageError::Corrupt { .. })));
        assert!(!report.is_complete());
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clinic.json");
        fs::write(&path, b"{\"veterinarians\": [\xff\xfe]}").unwrap();

        let (registry, report) = Registry::load(&ClinicStore::new(&path)).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(report.outcome, LoadOutcome::Corrupt(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clinic.json");
        fs::write(&path, r#"{"clients": "nobody"}"#).unwrap();

        let (_, report) = Registry::load(&ClinicStore::new(&path)).unwrap();
        assert!(matches!(report.outcome, LoadOutcome::Corrupt(_)));
    }

    #[test]
    fn test_save_writes_pretty_json_and_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clinic.json");
        fs::write(&path, "previous contents").unwrap();
        let store = ClinicStore::new(&path);

        let mut registry = Registry::new();
        registry.add_client(Client::new("Maria Lopez", "555-0100", "123 Oak St").unwrap());
        let report = registry.save(&store).unwrap();
        assert_eq!(report.clients, 1);

        let backup = fs::read_to_string(store.backup_path()).unwrap();
        assert_eq!(backup, "previous contents");

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("{\n  \"veterinarians\": []"));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_save_without_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clinic.json");
        fs::write(&path, "previous contents").unwrap();
        let store = ClinicStore::new(&path).with_backup(false);

        Registry::new().save(&store).unwrap();
        assert!(!store.backup_path().exists());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let store = ClinicStore::new(dir.path().join("nested/deeper/clinic.json"));
        Registry::new().save(&store).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_failure_keeps_registry_dirty() {
        let dir = tempdir().unwrap();
        // The store path is a directory, so the rename cannot replace it
        let path = dir.path().join("clinic.json");
        fs::create_dir(&path).unwrap();
        let store = ClinicStore::new(&path).with_backup(false);

        let mut registry = Registry::new();
        registry.add_client(Client::new("Maria Lopez", "555-0100", "123 Oak St").unwrap());

        assert!(matches!(registry.save(&store), Err(StorageError::Write { .. })));
        assert!(registry.has_unsaved_changes());
        assert_eq!(registry.clients().len(), 1);
    }
}
