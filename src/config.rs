use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::escrow::EscrowSettings;

/// Main configuration structure for job-escrow
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JobEscrowConfig {
    /// Escrow destination settings
    pub escrow: EscrowConfig,
    /// Job storage settings
    pub storage: StorageConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// Identity that receives client deposits (can be set via ESCROW_ADDRESS)
    pub destination_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON snapshot file
    File,
    /// Process memory only
    Memory,
    /// SQLite database (requires the `database` feature)
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Snapshot file path, or database URL for sqlite
    pub path: String,
    /// Run migrations on connect (sqlite only)
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub json: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: ".job-escrow/jobs.json".to_string(),
            auto_migrate: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: true,
        }
    }
}

impl JobEscrowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (job-escrow.toml)
    /// 3. Environment variables (prefixed with JOB_ESCROW__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("job-escrow.toml"))
    }

    /// Same as [`load`](Self::load) with an explicit configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("JOB_ESCROW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: JobEscrowConfig = builder.build()?.try_deserialize()?;

        // Conventional fallback for the escrow destination
        if config.escrow.destination_address.is_none() {
            if let Ok(address) = std::env::var("ESCROW_ADDRESS") {
                if !address.is_empty() {
                    config.escrow.destination_address = Some(address);
                }
            }
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn escrow_settings(&self) -> EscrowSettings {
        EscrowSettings {
            destination_address: self.escrow.destination_address.clone(),
        }
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<JobEscrowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = JobEscrowConfig::load_env_file();
        JobEscrowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static JobEscrowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_use_file_storage_without_destination() {
        let config = JobEscrowConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.path, ".job-escrow/jobs.json");
        assert!(config.escrow.destination_address.is_none());
        assert!(config.observability.json);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job-escrow.toml");
        std::fs::write(
            &path,
            r#"
[escrow]
destination_address = "ESCROW-1"

[storage]
backend = "memory"
"#,
        )
        .unwrap();

        let config = JobEscrowConfig::load_from(&path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(
            config.escrow_settings().destination_address.as_deref(),
            Some("ESCROW-1")
        );
        // untouched sections keep their defaults
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn save_round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = JobEscrowConfig::default();
        config.escrow.destination_address = Some("ESCROW-2".into());
        config.save_to_file(&path).unwrap();

        let loaded = JobEscrowConfig::load_from(&path).unwrap();
        assert_eq!(loaded.escrow.destination_address.as_deref(), Some("ESCROW-2"));
        assert_eq!(loaded.storage.path, config.storage.path);
    }
}
