//! Events delivered to application callbacks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tracking::BeaconObservation;

/// Category of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A required permission was not granted; scanning did not start.
    PermissionDenied,
    /// The radio is not powered on; scanning did not start.
    BluetoothDisabled,
    /// A scan window failed; later windows still run.
    BeaconScanFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::BluetoothDisabled => "BLUETOOTH_DISABLED",
            ErrorCode::BeaconScanFailed => "BEACON_SCAN_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported through the error callback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ScanError {
    pub code: ErrorCode,
    pub message: String,
}

impl ScanError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Snapshot emitted at the end of every completed scan window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconsUpdate {
    /// Live beacons, closest first.
    pub beacons: Vec<BeaconObservation>,
    pub timestamp: DateTime<Utc>,
}
