//! Monitored beacon regions.
//!
//! A region selects the advertisements the scanner reports. UUIDs compare
//! case-insensitively; `major` and `minor` narrow the match only when set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A set of beacons of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRegion {
    /// Proximity UUID (any case).
    pub uuid: String,
    /// Restrict to one major, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,
    /// Restrict to one minor, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,
}

impl BeaconRegion {
    /// Region matching every beacon with this UUID.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            major: None,
            minor: None,
        }
    }

    /// Restrict the region to one major number.
    pub fn with_major(mut self, major: u16) -> Self {
        self.major = Some(major);
        self
    }

    /// Restrict the region to one minor number.
    pub fn with_minor(mut self, minor: u16) -> Self {
        self.minor = Some(minor);
        self
    }

    /// Check whether a beacon falls within this region.
    pub fn matches(&self, uuid: &str, major: u16, minor: u16) -> bool {
        self.uuid.eq_ignore_ascii_case(uuid)
            && self.major.map_or(true, |m| m == major)
            && self.minor.map_or(true, |m| m == minor)
    }
}

impl fmt::Display for BeaconRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid.to_lowercase())?;
        match (self.major, self.minor) {
            (Some(major), Some(minor)) => write!(f, " [{}/{}]", major, minor),
            (Some(major), None) => write!(f, " [{}/*]", major),
            (None, Some(minor)) => write!(f, " [*/{}]", minor),
            (None, None) => Ok(()),
        }
    }
}

/// Check whether any region monitors the given beacon.
pub fn is_monitored(regions: &[BeaconRegion], uuid: &str, major: u16, minor: u16) -> bool {
    regions.iter().any(|r| r.matches(uuid, major, minor))
}
