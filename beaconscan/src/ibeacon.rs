//! Apple iBeacon manufacturer-data codec.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//! 0       2     company id, little-endian (0x004C = Apple)
//! 2       1     beacon type (0x02)
//! 3       1     remaining length (0x15 = 21)
//! 4       16    proximity UUID
//! 20      2     major, big-endian
//! 22      2     minor, big-endian
//! 24      1     calibrated tx power at 1 m, signed
//! ```
//!
//! Most BLE traffic is not an iBeacon, so a rejected payload is an expected
//! outcome rather than a failure. [`DecodeError`] records why a payload was
//! rejected for logging and diagnostics.

use std::fmt;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use thiserror::Error;
use uuid::Uuid;

/// Bluetooth SIG company identifier assigned to Apple.
pub const APPLE_COMPANY_ID: u16 = 0x004C;

/// iBeacon type byte.
pub const IBEACON_TYPE: u8 = 0x02;

/// iBeacon remaining-length byte.
pub const IBEACON_DATA_LENGTH: u8 = 0x15;

/// Minimum manufacturer-data length of an iBeacon advertisement.
pub const IBEACON_PAYLOAD_LEN: usize = 25;

/// Reasons a manufacturer-data payload is not a usable iBeacon frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The advertisement carried no manufacturer data.
    #[error("No manufacturer data")]
    Missing,

    /// The payload was not valid base64.
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// Fewer bytes than an iBeacon frame needs.
    #[error("Payload too short: {len} bytes (need {})", IBEACON_PAYLOAD_LEN)]
    TooShort { len: usize },

    /// Manufacturer is not Apple.
    #[error("Unexpected company id 0x{0:04X}")]
    CompanyId(u16),

    /// Apple payload that is not an iBeacon.
    #[error("Unexpected beacon type 0x{0:02X}")]
    BeaconType(u8),

    /// iBeacon type with the wrong length byte.
    #[error("Unexpected data length 0x{0:02X}")]
    DataLength(u8),
}

/// A decoded iBeacon advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IBeaconFrame {
    /// Proximity UUID identifying the beacon region.
    pub uuid: Uuid,
    /// Major number (beacon group).
    pub major: u16,
    /// Minor number (individual beacon).
    pub minor: u16,
    /// Calibrated RSSI at 1 meter, in dBm.
    pub tx_power: i8,
}

impl IBeaconFrame {
    /// Create a frame.
    pub fn new(uuid: Uuid, major: u16, minor: u16, tx_power: i8) -> Self {
        Self {
            uuid,
            major,
            minor,
            tx_power,
        }
    }

    /// Parse raw manufacturer-specific data.
    ///
    /// Bytes beyond the 25-byte frame are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < IBEACON_PAYLOAD_LEN {
            return Err(DecodeError::TooShort { len: data.len() });
        }

        let company_id = u16::from_le_bytes([data[0], data[1]]);
        if company_id != APPLE_COMPANY_ID {
            return Err(DecodeError::CompanyId(company_id));
        }
        if data[2] != IBEACON_TYPE {
            return Err(DecodeError::BeaconType(data[2]));
        }
        if data[3] != IBEACON_DATA_LENGTH {
            return Err(DecodeError::DataLength(data[3]));
        }

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[4..20]);

        Ok(Self {
            uuid: Uuid::from_bytes(uuid),
            major: u16::from_be_bytes([data[20], data[21]]),
            minor: u16::from_be_bytes([data[22], data[23]]),
            tx_power: data[24] as i8,
        })
    }

    /// Parse base64-encoded manufacturer data, as delivered by the radio layer.
    pub fn from_base64(encoded: &str) -> Result<Self, DecodeError> {
        let data = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
        Self::parse(&data)
    }

    /// Encode as manufacturer-specific data (company id included).
    pub fn to_manufacturer_data(&self) -> [u8; IBEACON_PAYLOAD_LEN] {
        let mut data = [0u8; IBEACON_PAYLOAD_LEN];
        data[0..2].copy_from_slice(&APPLE_COMPANY_ID.to_le_bytes());
        data[2] = IBEACON_TYPE;
        data[3] = IBEACON_DATA_LENGTH;
        data[4..20].copy_from_slice(self.uuid.as_bytes());
        data[20..22].copy_from_slice(&self.major.to_be_bytes());
        data[22..24].copy_from_slice(&self.minor.to_be_bytes());
        data[24] = self.tx_power as u8;
        data
    }

    /// Encode as base64 manufacturer data.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.to_manufacturer_data())
    }

    /// Canonical lowercase `8-4-4-4-12` form of the proximity UUID.
    pub fn uuid_string(&self) -> String {
        self.uuid.hyphenated().to_string()
    }
}

impl fmt::Display for IBeaconFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} major={} minor={} tx={}dBm",
            self.uuid.hyphenated(),
            self.major,
            self.minor,
            self.tx_power
        )
    }
}
