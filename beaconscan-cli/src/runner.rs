//! Shared setup for long-running commands: configuration and logging.

use std::path::Path;

use beaconscan::config::ConfigFile;
use beaconscan::logging::{default_log_dir, default_log_file, init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Keeps logging alive and holds the loaded configuration.
pub struct CliRunner {
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load configuration from `config_path` (or the default path) and
    /// start logging.
    ///
    /// Console logging is disabled when stdout carries JSON.
    pub fn new(config_path: Option<&Path>, console_logging: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&default_log_dir(), default_log_file(), console_logging)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!("BeaconScan v{}", beaconscan::VERSION);
        info!(
            regions = self.config.regions.len(),
            beacons = self.config.beacons.len(),
            "BeaconScan CLI: {} command",
            command
        );
    }
}
