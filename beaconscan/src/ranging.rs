//! Distance estimation from received signal strength.
//!
//! Uses the empirical ratio model common to iBeacon receivers: the ratio of
//! measured RSSI to the beacon's calibrated 1 m power is mapped to meters by
//! a power curve. The result is coarse by nature, so it is also bucketed into
//! an [`Accuracy`] tier for consumers that only need "how close".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel returned when a distance cannot be computed.
pub const UNKNOWN_DISTANCE: f64 = -1.0;

/// Upper bound (exclusive) of the `Immediate` tier, in meters.
pub const IMMEDIATE_THRESHOLD_M: f64 = 0.5;

/// Upper bound (exclusive) of the `Near` tier, in meters.
pub const NEAR_THRESHOLD_M: f64 = 3.0;

// Curve coefficients for ratio >= 1.0.
const CURVE_SCALE: f64 = 0.89976;
const CURVE_EXPONENT: f64 = 7.7095;
const CURVE_OFFSET: f64 = 0.111;

// Exponent used below a ratio of 1.0.
const NEAR_FIELD_EXPONENT: i32 = 10;

// Distances below this are treated as touching the beacon.
const MIN_EXPECTED_DISTANCE_M: f64 = 0.001;

/// Coarse proximity classification of a distance estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    /// Within half a meter.
    Immediate,
    /// Within three meters.
    Near,
    /// Three meters or more.
    Far,
    /// No usable estimate.
    Unknown,
}

impl Accuracy {
    /// Classify a distance estimate in meters.
    pub fn from_distance(distance: f64) -> Self {
        if distance < 0.0 {
            Accuracy::Unknown
        } else if distance < IMMEDIATE_THRESHOLD_M {
            Accuracy::Immediate
        } else if distance < NEAR_THRESHOLD_M {
            Accuracy::Near
        } else {
            Accuracy::Far
        }
    }

    /// Lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Accuracy::Immediate => "immediate",
            Accuracy::Near => "near",
            Accuracy::Far => "far",
            Accuracy::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimate distance in meters from an RSSI reading and calibrated tx power.
///
/// Accepts fractional RSSI so the same model serves raw readings and
/// low-pass filtered values.
///
/// Returns [`UNKNOWN_DISTANCE`] when `rssi` is exactly zero. Radios report
/// zero when they have no reading, so only that exact value is treated as
/// missing.
pub fn estimate_distance(rssi: f64, tx_power: i8) -> f64 {
    if rssi == 0.0 {
        return UNKNOWN_DISTANCE;
    }

    let ratio = rssi / f64::from(tx_power);
    if ratio < 1.0 {
        ratio.powi(NEAR_FIELD_EXPONENT)
    } else {
        CURVE_SCALE * ratio.powf(CURVE_EXPONENT) + CURVE_OFFSET
    }
}

/// Estimate distance and classify it in one step.
pub fn estimate(rssi: f64, tx_power: i8) -> (f64, Accuracy) {
    let distance = estimate_distance(rssi, tx_power);
    (distance, Accuracy::from_distance(distance))
}

/// Inverse of [`estimate_distance`]: the RSSI a receiver would measure at
/// `distance` meters from a beacon calibrated to `tx_power`.
///
/// The two branches of the forward model do not meet at a ratio of 1.0;
/// distances falling in that gap map to the calibrated power itself.
pub fn expected_rssi(distance: f64, tx_power: i8) -> f64 {
    let tx = f64::from(tx_power);
    let distance = distance.max(MIN_EXPECTED_DISTANCE_M);

    let ratio = if distance < 1.0 {
        distance.powf(1.0 / f64::from(NEAR_FIELD_EXPONENT))
    } else if distance < CURVE_SCALE + CURVE_OFFSET {
        1.0
    } else {
        ((distance - CURVE_OFFSET) / CURVE_SCALE).powf(1.0 / CURVE_EXPONENT)
    };

    ratio * tx
}
