//! Configuration file support for `~/.beaconscan/config.ini`.
//!
//! # Sections
//!
//! - `[scanner]`: window timing and platform
//! - `[region.NAME]`: one monitored region per section
//! - `[beacon.NAME]`: one beacon placement per section
//!
//! # Example
//!
//! ```ignore
//! use beaconscan::config::ConfigFile;
//!
//! let file = ConfigFile::load()?;
//! let config = file.scanner_config();
//! ```

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, BeaconSettings, ConfigFile, ConfigFileError,
    RegionSettings, ScannerSettings, DEFAULT_TX_POWER,
};
