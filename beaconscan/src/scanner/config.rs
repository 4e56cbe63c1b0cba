//! Scanner configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::events::{BeaconsUpdate, ScanError};
use crate::adapter::Platform;
use crate::position::BeaconConfig;
use crate::region::BeaconRegion;

/// Default time between the starts of consecutive scan windows.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(2000);

/// Default length of one scan window.
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_millis(1000);

/// Shortest accepted scan interval.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

/// Receives the sorted beacon snapshot at the end of each window.
pub type BeaconsCallback = Arc<dyn Fn(&BeaconsUpdate) + Send + Sync>;

/// Receives lifecycle and scan failures.
pub type ErrorCallback = Arc<dyn Fn(&ScanError) + Send + Sync>;

/// Configuration of a [`BeaconScanner`](super::BeaconScanner).
#[derive(Clone)]
pub struct ScannerConfig {
    /// Time between the starts of consecutive scan windows.
    pub scan_interval: Duration,
    /// Length of each scan window.
    pub scan_duration: Duration,
    /// Beacons outside every region are discarded.
    pub regions: Vec<BeaconRegion>,
    /// Known beacon placements used for positioning.
    pub beacon_configs: Vec<BeaconConfig>,
    /// Determines which permissions are requested.
    pub platform: Platform,
    pub on_beacons_updated: Option<BeaconsCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            scan_duration: DEFAULT_SCAN_DURATION,
            regions: Vec::new(),
            beacon_configs: Vec::new(),
            platform: Platform::Static,
            on_beacons_updated: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("scan_interval", &self.scan_interval)
            .field("scan_duration", &self.scan_duration)
            .field("regions", &self.regions)
            .field("beacon_configs", &self.beacon_configs.len())
            .field("platform", &self.platform)
            .field("on_beacons_updated", &self.on_beacons_updated.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }

    pub fn with_regions(mut self, regions: Vec<BeaconRegion>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_beacon_configs(mut self, configs: Vec<BeaconConfig>) -> Self {
        self.beacon_configs = configs;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn on_beacons_updated<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BeaconsUpdate) + Send + Sync + 'static,
    {
        self.on_beacons_updated = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ScanError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Apply the fields set in `update`.
    pub fn apply(&mut self, update: ScannerConfigUpdate) {
        if let Some(interval) = update.scan_interval {
            self.scan_interval = interval;
        }
        if let Some(duration) = update.scan_duration {
            self.scan_duration = duration;
        }
        if let Some(regions) = update.regions {
            self.regions = regions;
        }
        if let Some(configs) = update.beacon_configs {
            self.beacon_configs = configs;
        }
        if let Some(platform) = update.platform {
            self.platform = platform;
        }
        if let Some(callback) = update.on_beacons_updated {
            self.on_beacons_updated = Some(callback);
        }
        if let Some(callback) = update.on_error {
            self.on_error = Some(callback);
        }
    }
}

/// Partial configuration change. `None` leaves a field as it is.
///
/// A new `scan_interval` applies from the next `start_scanning`; the other
/// fields are picked up by the next scan window.
#[derive(Clone, Default)]
pub struct ScannerConfigUpdate {
    pub scan_interval: Option<Duration>,
    pub scan_duration: Option<Duration>,
    pub regions: Option<Vec<BeaconRegion>>,
    pub beacon_configs: Option<Vec<BeaconConfig>>,
    pub platform: Option<Platform>,
    pub on_beacons_updated: Option<BeaconsCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl ScannerConfigUpdate {
    /// Whether the update replaces the beacon placements.
    pub fn changes_placements(&self) -> bool {
        self.beacon_configs.is_some()
    }
}
