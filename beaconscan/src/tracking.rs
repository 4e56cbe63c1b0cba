//! Tracked-beacon table with RSSI smoothing and staleness eviction.
//!
//! Every decoded advertisement produces a [`BeaconObservation`]. The
//! [`BeaconTable`] folds observations of the same beacon into one
//! [`TrackedBeacon`] whose RSSI is low-pass filtered, so distance estimates
//! stop jumping with every packet. Entries that stop receiving observations
//! are evicted after [`BEACON_DECAY`].
//!
//! # Filter
//!
//! ```text
//! filtered = α·rssi + (1 − α)·filtered      α = 0.3
//! ```
//!
//! The first observation seeds `filtered` with the raw reading.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ibeacon::IBeaconFrame;
use crate::ranging::{self, Accuracy};

/// Smoothing coefficient applied to each new RSSI sample.
pub const RSSI_SMOOTHING_FACTOR: f64 = 0.3;

/// How long a beacon may go without an observation before it is evicted.
pub const BEACON_DECAY: Duration = Duration::from_millis(5000);

/// RSSI reported when the radio gives none.
pub const DEFAULT_RSSI: i16 = -100;

/// Identity of a physical beacon: `uuid_major_minor`.
///
/// The UUID is normalized to lowercase so placements supplied in any case
/// resolve to the same key as decoded advertisements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeaconKey {
    uuid: String,
    major: u16,
    minor: u16,
}

impl BeaconKey {
    /// Create a key.
    pub fn new(uuid: &str, major: u16, minor: u16) -> Self {
        Self {
            uuid: uuid.to_ascii_lowercase(),
            major,
            minor,
        }
    }

    /// Lowercase UUID.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Major number.
    pub fn major(&self) -> u16 {
        self.major
    }

    /// Minor number.
    pub fn minor(&self) -> u16 {
        self.minor
    }
}

impl fmt::Display for BeaconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.uuid, self.major, self.minor)
    }
}

/// One detected iBeacon advertisement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconObservation {
    /// Lowercase hyphenated proximity UUID.
    pub uuid: String,
    /// Major number.
    pub major: u16,
    /// Minor number.
    pub minor: u16,
    /// Signal strength in dBm.
    pub rssi: i16,
    /// Calibrated power at 1 m, in dBm.
    pub tx_power: i8,
    /// Estimated distance in meters, or [`ranging::UNKNOWN_DISTANCE`].
    pub distance: f64,
    /// Proximity tier of `distance`.
    pub accuracy: Accuracy,
    /// When the advertisement was received.
    pub last_seen: DateTime<Utc>,
}

impl BeaconObservation {
    /// Build an observation from a decoded frame and the radio's RSSI.
    ///
    /// A missing RSSI is reported as [`DEFAULT_RSSI`].
    pub fn from_frame(frame: &IBeaconFrame, rssi: Option<i16>, seen_at: DateTime<Utc>) -> Self {
        let rssi = rssi.unwrap_or(DEFAULT_RSSI);
        let (distance, accuracy) = ranging::estimate(f64::from(rssi), frame.tx_power);
        Self {
            uuid: frame.uuid_string(),
            major: frame.major,
            minor: frame.minor,
            rssi,
            tx_power: frame.tx_power,
            distance,
            accuracy,
            last_seen: seen_at,
        }
    }

    /// Table key for this observation.
    pub fn key(&self) -> BeaconKey {
        BeaconKey::new(&self.uuid, self.major, self.minor)
    }
}

/// A beacon with smoothed signal state.
#[derive(Debug, Clone)]
pub struct TrackedBeacon {
    /// Most recent observation, with distance and accuracy taken from the
    /// filtered RSSI rather than the raw reading.
    pub observation: BeaconObservation,
    /// Low-pass filtered RSSI.
    pub filtered_rssi: f64,
    /// When the entry was last folded.
    pub last_updated: Instant,
}

impl TrackedBeacon {
    fn new(observation: BeaconObservation, now: Instant) -> Self {
        Self {
            filtered_rssi: f64::from(observation.rssi),
            observation,
            last_updated: now,
        }
    }

    fn fold(&mut self, observation: BeaconObservation, alpha: f64, now: Instant) {
        self.filtered_rssi =
            alpha * f64::from(observation.rssi) + (1.0 - alpha) * self.filtered_rssi;

        let (distance, accuracy) = ranging::estimate(self.filtered_rssi, observation.tx_power);
        self.observation = BeaconObservation {
            distance,
            accuracy,
            ..observation
        };
        self.last_updated = now;
    }

    /// Estimated distance from the filtered RSSI.
    pub fn distance(&self) -> f64 {
        self.observation.distance
    }

    /// Time since the last fold.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_updated)
    }

    /// Observation as reported to consumers: filtered RSSI (rounded to whole
    /// dBm) with the distance and accuracy derived from it.
    pub fn to_report(&self) -> BeaconObservation {
        BeaconObservation {
            rssi: self.filtered_rssi.round() as i16,
            ..self.observation.clone()
        }
    }
}

/// Table of tracked beacons keyed by `uuid_major_minor`.
#[derive(Debug)]
pub struct BeaconTable {
    beacons: HashMap<BeaconKey, TrackedBeacon>,
    smoothing: f64,
    decay: Duration,
}

impl Default for BeaconTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BeaconTable {
    /// Create an empty table with the standard filter and decay window.
    pub fn new() -> Self {
        Self::with_params(RSSI_SMOOTHING_FACTOR, BEACON_DECAY)
    }

    /// Create with an explicit smoothing coefficient and decay window.
    pub fn with_params(smoothing: f64, decay: Duration) -> Self {
        Self {
            beacons: HashMap::new(),
            smoothing: smoothing.clamp(0.0, 1.0),
            decay,
        }
    }

    /// Fold an observation into the table.
    ///
    /// Returns the updated entry.
    pub fn fold(&mut self, observation: BeaconObservation, now: Instant) -> &TrackedBeacon {
        let alpha = self.smoothing;
        match self.beacons.entry(observation.key()) {
            Entry::Occupied(entry) => {
                let tracked = entry.into_mut();
                tracked.fold(observation, alpha, now);
                tracked
            }
            Entry::Vacant(entry) => entry.insert(TrackedBeacon::new(observation, now)),
        }
    }

    /// Remove entries not updated within the decay window.
    ///
    /// Returns the number of entries removed.
    pub fn evict_stale(&mut self, now: Instant) -> usize {
        let before = self.beacons.len();
        let decay = self.decay;
        self.beacons.retain(|_, tracked| tracked.age(now) <= decay);
        before - self.beacons.len()
    }

    /// Live entries sorted by ascending distance (closest first).
    pub fn sorted(&self) -> Vec<&TrackedBeacon> {
        let mut beacons: Vec<_> = self.beacons.values().collect();
        beacons.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
        beacons
    }

    /// Reported observations sorted by ascending distance.
    pub fn snapshot(&self) -> Vec<BeaconObservation> {
        self.sorted().into_iter().map(TrackedBeacon::to_report).collect()
    }

    /// Look up one beacon.
    pub fn get(&self, key: &BeaconKey) -> Option<&TrackedBeacon> {
        self.beacons.get(key)
    }

    /// Number of tracked beacons.
    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    /// Whether no beacons are tracked.
    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }

    /// Forget every beacon.
    pub fn clear(&mut self) {
        self.beacons.clear();
    }
}
