//! Veterinary clinic console
//!
//! Loads the registry from the JSON store, runs the interactive menu and
//! saves on exit.

mod menu;
mod prompt;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vet_clinic_core::{ClinicConfig, ClinicStore, LoadOutcome, Registry};

use crate::menu::ClinicApp;
use crate::prompt::Prompter;

#[derive(Parser)]
#[command(name = "vet-clinic")]
#[command(about = "Manage clients, pets, veterinarians and appointments")]
struct Cli {
    /// Store file (overrides `store.path` from the configuration)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Additional configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Do not keep a backup of the previous store file
    #[arg(long)]
    no_backup: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config =
        ClinicConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.store {
        config.store.path = path;
    }
    if cli.no_backup {
        config.store.backup = false;
    }
    tracing::debug!(?config, "configuration loaded");

    let store = ClinicStore::from_config(&config.store);
    let registry = open_registry(&store);

    let stdin = io::stdin();
    let prompter = Prompter::new(stdin.lock(), io::stdout(), config.input.max_attempts);

    println!("=== Veterinary Clinic ===");
    let mut app = ClinicApp::new(registry, store, prompter);
    app.run().context("console session failed")?;

    Ok(())
}

/// Load the registry, falling back to an empty one when the store is unreadable.
fn open_registry(store: &ClinicStore) -> Registry {
    let (registry, report) = match Registry::load(store) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Could not read {}: {}", store.path().display(), e);
            eprintln!("Starting with an empty registry");
            return Registry::new();
        }
    };

    match &report.outcome {
        LoadOutcome::Missing => {
            println!("No data at {}, starting fresh", store.path().display());
        }
        LoadOutcome::Corrupt(e) => {
            eprintln!("{}", e);
            eprintln!("Starting with an empty registry");
        }
        LoadOutcome::Loaded => {
            println!(
                "Loaded {} clients, {} pets, {} veterinarians, {} appointments",
                registry.clients().len(),
                registry.pet_count(),
                registry.veterinarians().len(),
                registry.appointments().len()
            );
        }
    }

    if !report.diagnostics.is_empty() {
        eprintln!("{} records were skipped:", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            eprintln!("  {}", diagnostic);
        }
    }

    registry
}
