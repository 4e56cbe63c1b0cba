//! Weighted-centroid position estimation from known beacon placements.
//!
//! # Algorithm
//!
//! 1. Take the [`MAX_POSITION_BEACONS`] nearest tracked beacons
//! 2. Keep those with a known placement ([`BeaconConfig`])
//! 3. Weight each by `1 / max(distance, 0.1)`
//! 4. Average the placements' `latitude`/`longitude` as planar x/y
//! 5. Pick the floor with the greatest accumulated weight
//!
//! The x/y average is taken over every contributing beacon regardless of
//! floor, so beacons on neighbouring floors blend into the planar estimate.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tracking::{BeaconKey, BeaconObservation};

/// Fewest placed beacons needed for a position fix.
pub const MIN_POSITION_BEACONS: usize = 3;

/// Nearest beacons considered for a fix.
pub const MAX_POSITION_BEACONS: usize = 5;

/// Distance floor for weighting, so a beacon at ~0 m cannot dominate.
pub const MIN_WEIGHT_DISTANCE_M: f64 = 0.1;

/// Physical placement of a beacon.
///
/// `latitude`/`longitude` are used as planar x/y; no projection is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Planar x, in meters.
    pub latitude: f64,
    /// Planar y, in meters.
    pub longitude: f64,
    /// Building floor.
    pub floor: i32,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64, floor: i32) -> Self {
        Self {
            latitude,
            longitude,
            floor,
        }
    }
}

/// Known placement of one beacon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconConfig {
    /// Proximity UUID (any case).
    pub uuid: String,
    /// Major number of the beacon.
    pub major: u16,
    /// Minor number of the beacon.
    pub minor: u16,
    /// Where the beacon is mounted.
    pub coordinate: Coordinate,
}

impl BeaconConfig {
    /// Create a placement.
    pub fn new(uuid: impl Into<String>, major: u16, minor: u16, coordinate: Coordinate) -> Self {
        Self {
            uuid: uuid.into(),
            major,
            minor,
            coordinate,
        }
    }

    /// Table key, identical to the tracked beacon's key.
    pub fn key(&self) -> BeaconKey {
        BeaconKey::new(&self.uuid, self.major, self.minor)
    }
}

/// Estimated listener position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Weighted x, on the `latitude` axis.
    pub x: f64,
    /// Weighted y, on the `longitude` axis.
    pub y: f64,
    /// Floor with the largest summed weight.
    pub floor: i32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}) floor {}", self.x, self.y, self.floor)
    }
}

/// Beacon placements indexed by `uuid_major_minor`.
#[derive(Debug, Clone, Default)]
pub struct BeaconPlacements {
    by_key: HashMap<BeaconKey, BeaconConfig>,
}

impl BeaconPlacements {
    /// Build the lookup table. Later duplicates replace earlier ones.
    pub fn new(configs: impl IntoIterator<Item = BeaconConfig>) -> Self {
        let by_key = configs.into_iter().map(|c| (c.key(), c)).collect();
        Self { by_key }
    }

    /// Look up a placement.
    pub fn get(&self, uuid: &str, major: u16, minor: u16) -> Option<&BeaconConfig> {
        self.by_key.get(&BeaconKey::new(uuid, major, minor))
    }

    /// Look up a placement by key.
    pub fn get_by_key(&self, key: &BeaconKey) -> Option<&BeaconConfig> {
        self.by_key.get(key)
    }

    /// Number of placements.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether there are no placements.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Estimate a position from beacons sorted closest first.
    ///
    /// Returns `None` with fewer than [`MIN_POSITION_BEACONS`] beacons, or
    /// when fewer than that many of the nearest ones have a placement.
    pub fn locate(&self, nearest_first: &[BeaconObservation]) -> Option<Position> {
        if nearest_first.len() < MIN_POSITION_BEACONS {
            return None;
        }

        let contributors: Vec<(&Coordinate, f64)> = nearest_first
            .iter()
            .take(MAX_POSITION_BEACONS)
            .filter_map(|beacon| {
                self.get_by_key(&beacon.key())
                    .map(|config| (&config.coordinate, weight(beacon.distance)))
            })
            .collect();

        if contributors.len() < MIN_POSITION_BEACONS {
            return None;
        }

        let mut total_weight = 0.0;
        let mut x = 0.0;
        let mut y = 0.0;
        // BTreeMap so equal weights resolve to the lowest floor
        let mut floor_weights: BTreeMap<i32, f64> = BTreeMap::new();

        for (coordinate, w) in &contributors {
            total_weight += w;
            x += coordinate.latitude * w;
            y += coordinate.longitude * w;
            *floor_weights.entry(coordinate.floor).or_insert(0.0) += w;
        }

        let mut floor = contributors[0].0.floor;
        let mut best = f64::NEG_INFINITY;
        for (candidate, w) in floor_weights {
            if w > best {
                best = w;
                floor = candidate;
            }
        }

        Some(Position {
            x: x / total_weight,
            y: y / total_weight,
            floor,
        })
    }
}

fn weight(distance: f64) -> f64 {
    1.0 / distance.max(MIN_WEIGHT_DISTANCE_M)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::Accuracy;
    use chrono::Utc;

    const UUID: &str = "f7826da6-4fa2-4e98-8024-bc5b71e0893e";

    fn beacon(minor: u16, distance: f64) -> BeaconObservation {
        BeaconObservation {
            uuid: UUID.to_string(),
            major: 1,
            minor,
            rssi: -60,
            tx_power: -59,
            distance,
            accuracy: Accuracy::from_distance(distance),
            last_seen: Utc::now(),
        }
    }

    fn place(minor: u16, x: f64, y: f64, floor: i32) -> BeaconConfig {
        BeaconConfig::new(UUID, 1, minor, Coordinate::new(x, y, floor))
    }

    fn triangle() -> BeaconPlacements {
        BeaconPlacements::new(vec![
            place(1, 0.0, 0.0, 1),
            place(2, 10.0, 0.0, 1),
            place(3, 0.0, 10.0, 1),
        ])
    }

    #[test]
    fn test_equal_weights_give_centroid() {
        let beacons = vec![beacon(1, 1.0), beacon(2, 1.0), beacon(3, 1.0)];
        let position = triangle().locate(&beacons).unwrap();

        assert!((position.x - 10.0 / 3.0).abs() < 1e-9);
        assert!((position.y - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(position.floor, 1);
    }

    #[test]
    fn test_closer_beacon_pulls_estimate() {
        let beacons = vec![beacon(2, 0.5), beacon(1, 5.0), beacon(3, 5.0)];
        let position = triangle().locate(&beacons).unwrap();
        assert!(position.x > 5.0, "x = {}", position.x);
    }

    #[test]
    fn test_too_few_tracked() {
        let beacons = vec![beacon(1, 1.0), beacon(2, 1.0)];
        assert!(triangle().locate(&beacons).is_none());
    }

    #[test]
    fn test_too_few_configured_despite_many_tracked() {
        let placements = BeaconPlacements::new(vec![place(1, 0.0, 0.0, 1), place(2, 10.0, 0.0, 1)]);
        let beacons = vec![
            beacon(1, 1.0),
            beacon(2, 1.0),
            beacon(7, 1.0),
            beacon(8, 1.0),
        ];
        assert!(placements.locate(&beacons).is_none());
    }

    #[test]
    fn test_only_five_nearest_considered() {
        // The configured beacons sit beyond the five nearest
        let placements = triangle();
        let mut beacons: Vec<_> = (10..15).map(|m| beacon(m, 0.5)).collect();
        beacons.extend([beacon(1, 2.0), beacon(2, 2.0), beacon(3, 2.0)]);
        assert!(placements.locate(&beacons).is_none());
    }

    #[test]
    fn test_zero_distance_weight_is_capped() {
        let beacons = vec![beacon(1, 0.0), beacon(2, 0.1), beacon(3, 0.1)];
        let position = triangle().locate(&beacons).unwrap();
        // Weights are all 10, so the centroid is unweighted
        assert!((position.x - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_is_weighted_vote() {
        let placements = BeaconPlacements::new(vec![
            place(1, 0.0, 0.0, 2),
            place(2, 10.0, 0.0, 1),
            place(3, 0.0, 10.0, 1),
        ]);
        // Floor 2 has one very close beacon outweighing two far ones
        let beacons = vec![beacon(1, 0.5), beacon(2, 4.0), beacon(3, 4.0)];
        let position = placements.locate(&beacons).unwrap();
        assert_eq!(position.floor, 2);

        // x/y still blend all floors
        assert!(position.x > 0.0 && position.y > 0.0);
    }

    #[test]
    fn test_floor_tie_prefers_lowest() {
        let placements = BeaconPlacements::new(vec![
            place(1, 0.0, 0.0, 3),
            place(2, 10.0, 0.0, 1),
            place(3, 0.0, 10.0, 3),
            place(4, 10.0, 10.0, 1),
        ]);
        let beacons = vec![beacon(1, 1.0), beacon(2, 1.0), beacon(3, 1.0), beacon(4, 1.0)];
        assert_eq!(placements.locate(&beacons).unwrap().floor, 1);
    }

    #[test]
    fn test_lookup_ignores_uuid_case() {
        let placements = BeaconPlacements::new(vec![BeaconConfig::new(
            UUID.to_uppercase(),
            1,
            1,
            Coordinate::new(1.0, 2.0, 0),
        )]);
        assert!(placements.get(UUID, 1, 1).is_some());
        assert!(placements.get(UUID, 1, 2).is_none());
    }

    #[test]
    fn test_position_display() {
        let position = Position {
            x: 3.333,
            y: 1.0,
            floor: 2,
        };
        assert_eq!(position.to_string(), "(3.33, 1.00) floor 2");
    }
}
