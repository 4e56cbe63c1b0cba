//! Configuration file types and loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::adapter::{Platform, SimulatedBeacon};
use crate::ibeacon::IBeaconFrame;
use crate::position::BeaconConfig;
use crate::region::BeaconRegion;
use crate::scanner::{ScannerConfig, DEFAULT_SCAN_DURATION, DEFAULT_SCAN_INTERVAL};

/// Calibrated 1 m power assumed when a beacon section gives none.
pub const DEFAULT_TX_POWER: i8 = -59;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to parse config text
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// A value failed validation
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// A required key is absent
    #[error("Missing configuration: {section}.{key}")]
    MissingKey { section: String, key: String },
}

/// `[scanner]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerSettings {
    pub scan_interval: Duration,
    pub scan_duration: Duration,
    pub platform: Platform,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            scan_duration: DEFAULT_SCAN_DURATION,
            platform: Platform::Static,
        }
    }
}

/// A `[region.NAME]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSettings {
    pub name: String,
    pub region: BeaconRegion,
}

/// A `[beacon.NAME]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconSettings {
    pub name: String,
    pub config: BeaconConfig,
    pub tx_power: i8,
}

impl BeaconSettings {
    /// Virtual beacon advertising this placement.
    pub fn to_simulated(&self) -> Option<SimulatedBeacon> {
        let uuid = uuid::Uuid::parse_str(&self.config.uuid).ok()?;
        let frame = IBeaconFrame::new(uuid, self.config.major, self.config.minor, self.tx_power);
        Some(SimulatedBeacon::new(frame, self.config.coordinate))
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub scanner: ScannerSettings,
    pub regions: Vec<RegionSettings>,
    pub beacons: Vec<BeaconSettings>,
}

impl ConfigFile {
    /// Load from the default path (`~/.beaconscan/config.ini`).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration text.
    pub fn parse_str(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigFileError::ParseError(e.to_string()))?;
        super::parser::parse_ini(&ini)
    }

    /// Scanner configuration without callbacks.
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::new()
            .with_scan_interval(self.scanner.scan_interval)
            .with_scan_duration(self.scanner.scan_duration)
            .with_platform(self.scanner.platform)
            .with_regions(self.regions.iter().map(|r| r.region.clone()).collect())
            .with_beacon_configs(self.beacons.iter().map(|b| b.config.clone()).collect())
    }

    /// Virtual beacons for every configured placement.
    pub fn simulated_beacons(&self) -> Vec<SimulatedBeacon> {
        self.beacons
            .iter()
            .filter_map(BeaconSettings::to_simulated)
            .collect()
    }
}

/// Path to the config directory (`~/.beaconscan`).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".beaconscan")
}

/// Path to the config file (`~/.beaconscan/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
