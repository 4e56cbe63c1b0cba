//! BLE radio abstraction.
//!
//! The scanner never talks to a Bluetooth stack directly. It drives a
//! [`BleAdapter`], which platform backends (or the [`SimulatedAdapter`])
//! implement. Device discovery is delivered over an unbounded channel of
//! [`DeviceScanEvent`]s for the lifetime of one device scan.
//!
//! # Dyn Compatibility
//!
//! Async methods return [`BoxFuture`] so the scanner can hold an
//! `Arc<dyn BleAdapter>`.

mod platform;
mod simulated;

pub use platform::{ParsePlatformError, Permission, PermissionStatus, Platform};
pub use simulated::{SimulatedAdapter, SimulatedBeacon, SimulatorStats};

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tokio::sync::mpsc;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Power and availability state of the local Bluetooth radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterState {
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterState::Unknown => "Unknown",
            AdapterState::Resetting => "Resetting",
            AdapterState::Unsupported => "Unsupported",
            AdapterState::Unauthorized => "Unauthorized",
            AdapterState::PoweredOff => "PoweredOff",
            AdapterState::PoweredOn => "PoweredOn",
        };
        f.write_str(name)
    }
}

/// Options for a device scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Report every advertisement, not just the first per device.
    pub allow_duplicates: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            allow_duplicates: true,
        }
    }
}

/// One advertisement as reported by the radio.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScannedDevice {
    /// Device identifier, if the platform exposes one.
    pub id: Option<String>,
    /// Manufacturer-specific data, base64-encoded.
    pub manufacturer_data: Option<String>,
    /// Received signal strength in dBm.
    pub rssi: Option<i16>,
}

/// Errors reported by a BLE adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The device scan could not be started.
    #[error("Failed to start device scan: {0}")]
    StartScan(String),

    /// The radio reported an error while scanning.
    #[error("Scan error: {0}")]
    Scan(String),

    /// The adapter has been destroyed.
    #[error("Adapter destroyed")]
    Destroyed,
}

/// Event delivered during a device scan.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceScanEvent {
    /// An advertisement was received.
    Device(ScannedDevice),
    /// The scan failed; no more devices follow in this scan.
    Error(AdapterError),
}

/// Receiver side of a device scan.
pub type DeviceScanReceiver = mpsc::UnboundedReceiver<DeviceScanEvent>;

/// Platform BLE radio.
///
/// Implementations must be `Send + Sync`; the scanner calls them from its
/// scan-loop task.
pub trait BleAdapter: Send + Sync {
    /// Current radio state.
    fn adapter_state(&self) -> BoxFuture<'_, AdapterState>;

    /// Ask the platform to grant `permissions`.
    ///
    /// Returns the outcome for each requested permission.
    fn request_permissions<'a>(
        &'a self,
        permissions: &'a [Permission],
    ) -> BoxFuture<'a, HashMap<Permission, PermissionStatus>>;

    /// Begin discovering devices.
    ///
    /// Events flow until [`stop_device_scan`](Self::stop_device_scan) is
    /// called or an [`DeviceScanEvent::Error`] is sent.
    fn start_device_scan(&self, options: &ScanOptions) -> Result<DeviceScanReceiver, AdapterError>;

    /// Stop the active device scan, if any.
    fn stop_device_scan(&self);

    /// Release the radio. The adapter is unusable afterwards.
    fn destroy(&self);
}
