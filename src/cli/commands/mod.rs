use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use super::Cli;
use crate::actions::ActionResponse;
use crate::config::{self, JobEscrowConfig, StorageBackend, StorageConfig};
use crate::repository::{FileJobRepository, InMemoryJobRepository, JobRepository};
use crate::service::JobService;
use crate::telemetry::init_telemetry;

pub mod action;
pub mod apply;

pub use action::ActionCommand;
pub use apply::ApplyCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, service: &JobService) -> Result<ActionResponse>;
}

/// Parsed subcommand ready to run
pub enum CliCommand {
    Action(ActionCommand),
    Apply(ApplyCommand),
}

impl Command for CliCommand {
    async fn execute(&self, service: &JobService) -> Result<ActionResponse> {
        match self {
            CliCommand::Action(command) => command.execute(service).await,
            CliCommand::Apply(command) => command.execute(service).await,
        }
    }
}

/// Parse-to-exit driver for the binary.
///
/// Prints the response envelope as JSON on stdout; a failed action exits 1.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;

    if let Err(e) = init_telemetry(&config.observability) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let repository = open_repository(&config.storage).await?;
    let service = JobService::new(repository, config.escrow_settings());

    let response = CliCommand::from(cli.command).execute(&service).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Configuration with command-line overrides applied
pub fn resolve_config(cli: &Cli) -> Result<JobEscrowConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = Path::new(path);
            anyhow::ensure!(path.exists(), "configuration file {} not found", path.display());
            // logging is not installed yet
            if let Err(e) = JobEscrowConfig::load_env_file() {
                eprintln!("Warning: ignoring unreadable .env file: {e}");
            }
            JobEscrowConfig::load_from(path)?
        }
        None => config::config()?.clone(),
    };

    if let Some(store) = &cli.store {
        config.storage.backend = StorageBackend::File;
        config.storage.path = store.clone();
    }
    if let Some(address) = &cli.escrow_address {
        config.escrow.destination_address = Some(address.clone());
    }

    Ok(config)
}

pub async fn open_repository(storage: &StorageConfig) -> Result<Arc<dyn JobRepository>> {
    match storage.backend {
        StorageBackend::File => {
            let repository = FileJobRepository::open(&storage.path)
                .with_context(|| format!("opening job store {}", storage.path))?;
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => Ok(Arc::new(InMemoryJobRepository::new())),
        #[cfg(feature = "database")]
        StorageBackend::Sqlite => {
            let repository =
                crate::repository::SqliteJobRepository::connect(&storage.path, storage.auto_migrate)
                    .await
                    .with_context(|| format!("connecting to {}", storage.path))?;
            Ok(Arc::new(repository))
        }
        #[cfg(not(feature = "database"))]
        StorageBackend::Sqlite => {
            anyhow::bail!("sqlite storage requires building with the `database` feature")
        }
    }
}
