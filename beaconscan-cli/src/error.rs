//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use beaconscan::config::ConfigFileError;
use beaconscan::ibeacon::DecodeError;
use beaconscan::scanner::{ErrorCode, ScanError};

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Invalid command-line arguments or configuration content
    Usage(String),
    /// Payload is not an iBeacon frame
    Decode(DecodeError),
    /// Scanner could not start
    Scan(ScanError),
    /// Tokio runtime or signal handler setup failed
    Runtime(String),
    /// Failed to serialize output
    Output(serde_json::Error),
}

impl CliError {
    /// Print the error and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Scan(ScanError {
                code: ErrorCode::PermissionDenied,
                ..
            }) => {
                eprintln!();
                eprintln!("Check that the configured platform matches the device:");
                eprintln!("  platform = static        (desktop, iOS)");
                eprintln!("  platform = android:<api> (Android runtime permissions)");
            }
            CliError::Config(ConfigFileError::ReadError(_)) => {
                eprintln!();
                eprintln!("Run 'beaconscan config path' to see which file is read.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Decode(e) => write!(f, "Not an iBeacon payload: {}", e),
            CliError::Scan(e) => write!(f, "Scanner failed to start: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Decode(e) => Some(e),
            CliError::Scan(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
