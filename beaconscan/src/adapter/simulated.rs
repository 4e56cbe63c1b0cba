//! In-process BLE adapter driven by virtual beacons.
//!
//! Each virtual beacon has a physical placement. While a device scan runs,
//! the adapter advertises every beacon once per `advertise_interval`, with
//! an RSSI derived from the listener's distance through
//! [`ranging::expected_rssi`] plus bounded noise. Faults (powered-off radio,
//! denied permissions, failing scans) can be injected for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{
    AdapterError, AdapterState, BleAdapter, BoxFuture, DeviceScanEvent, DeviceScanReceiver,
    Permission, PermissionStatus, ScanOptions, ScannedDevice,
};
use crate::ibeacon::IBeaconFrame;
use crate::position::Coordinate;
use crate::ranging;

/// Default time between advertisements of one beacon.
pub const DEFAULT_ADVERTISE_INTERVAL: Duration = Duration::from_millis(100);

/// Vertical distance per floor, in meters.
pub const FLOOR_HEIGHT_M: f64 = 4.0;

/// Strongest RSSI the simulator reports. Zero is the radio's "no reading".
const MAX_SIMULATED_RSSI: f64 = -1.0;
const MIN_SIMULATED_RSSI: f64 = -127.0;

/// A virtual beacon.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedBeacon {
    pub frame: IBeaconFrame,
    pub coordinate: Coordinate,
    /// Fixed RSSI instead of the distance-derived value.
    pub rssi_override: Option<i16>,
}

impl SimulatedBeacon {
    pub fn new(frame: IBeaconFrame, coordinate: Coordinate) -> Self {
        Self {
            frame,
            coordinate,
            rssi_override: None,
        }
    }

    /// Always advertise with this RSSI.
    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi_override = Some(rssi);
        self
    }
}

/// Calls observed by the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatorStats {
    pub scans_started: usize,
    pub scans_stopped: usize,
    pub permission_requests: usize,
    pub advertisements_sent: u64,
    pub destroyed: bool,
}

struct SimState {
    adapter_state: AdapterState,
    denied: HashSet<Permission>,
    beacons: Vec<SimulatedBeacon>,
    raw_devices: Vec<ScannedDevice>,
    listener: Coordinate,
    noise_db: f64,
    rng: StdRng,
    fail_next_scan: Option<String>,
    error_next_scan: Option<String>,
    active_scan: Option<CancellationToken>,
    stats: SimulatorStats,
}

impl SimState {
    fn advertisements(&mut self) -> Vec<ScannedDevice> {
        let listener = self.listener;
        let noise_db = self.noise_db;
        let mut devices = Vec::with_capacity(self.beacons.len() + self.raw_devices.len());

        for beacon in &self.beacons {
            let rssi = match beacon.rssi_override {
                Some(rssi) => rssi,
                None => {
                    let distance = distance_between(&listener, &beacon.coordinate);
                    let noise = if noise_db > 0.0 {
                        self.rng.random_range(-noise_db..=noise_db)
                    } else {
                        0.0
                    };
                    let rssi = ranging::expected_rssi(distance, beacon.frame.tx_power) + noise;
                    rssi.clamp(MIN_SIMULATED_RSSI, MAX_SIMULATED_RSSI).round() as i16
                }
            };

            devices.push(ScannedDevice {
                id: Some(format!(
                    "sim-{}-{}",
                    beacon.frame.major, beacon.frame.minor
                )),
                manufacturer_data: Some(beacon.frame.to_base64()),
                rssi: Some(rssi),
            });
        }

        devices.extend(self.raw_devices.iter().cloned());
        self.stats.advertisements_sent += devices.len() as u64;
        devices
    }
}

/// Planar distance plus floor separation.
fn distance_between(a: &Coordinate, b: &Coordinate) -> f64 {
    let dx = a.latitude - b.latitude;
    let dy = a.longitude - b.longitude;
    let dz = f64::from(a.floor - b.floor) * FLOOR_HEIGHT_M;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// BLE adapter backed by virtual beacons.
///
/// Cheap to clone; clones share the same simulated radio, so a test can
/// keep a handle for fault injection while the scanner owns another.
#[derive(Clone)]
pub struct SimulatedAdapter {
    inner: Arc<Mutex<SimState>>,
    advertise_interval: Duration,
}

impl Default for SimulatedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAdapter {
    /// Powered-on radio with every permission granted and no beacons.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                adapter_state: AdapterState::PoweredOn,
                denied: HashSet::new(),
                beacons: Vec::new(),
                raw_devices: Vec::new(),
                listener: Coordinate::new(0.0, 0.0, 0),
                noise_db: 0.0,
                rng: StdRng::seed_from_u64(0),
                fail_next_scan: None,
                error_next_scan: None,
                active_scan: None,
                stats: SimulatorStats::default(),
            })),
            advertise_interval: DEFAULT_ADVERTISE_INTERVAL,
        }
    }

    /// Time between advertisements of each beacon (minimum 1 ms).
    pub fn with_advertise_interval(mut self, interval: Duration) -> Self {
        self.advertise_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Uniform RSSI noise in `±noise_db`, from a seeded generator.
    pub fn with_noise(self, noise_db: f64, seed: u64) -> Self {
        {
            let mut state = self.inner.lock();
            state.noise_db = noise_db.abs();
            state.rng = StdRng::seed_from_u64(seed);
        }
        self
    }

    /// Add virtual beacons.
    pub fn with_beacons(self, beacons: impl IntoIterator<Item = SimulatedBeacon>) -> Self {
        self.inner.lock().beacons.extend(beacons);
        self
    }

    /// Place the listener.
    pub fn with_listener(self, listener: Coordinate) -> Self {
        self.set_listener(listener);
        self
    }

    pub fn add_beacon(&self, beacon: SimulatedBeacon) {
        self.inner.lock().beacons.push(beacon);
    }

    /// Remove beacons by major/minor. Returns the number removed.
    pub fn remove_beacon(&self, major: u16, minor: u16) -> usize {
        let mut state = self.inner.lock();
        let before = state.beacons.len();
        state
            .beacons
            .retain(|b| !(b.frame.major == major && b.frame.minor == minor));
        before - state.beacons.len()
    }

    /// Advertise a raw device, typically one that is not an iBeacon.
    pub fn add_raw_device(&self, device: ScannedDevice) {
        self.inner.lock().raw_devices.push(device);
    }

    pub fn set_listener(&self, listener: Coordinate) {
        self.inner.lock().listener = listener;
    }

    pub fn set_adapter_state(&self, state: AdapterState) {
        self.inner.lock().adapter_state = state;
    }

    /// Deny a permission on every later request.
    pub fn deny_permission(&self, permission: Permission) {
        self.inner.lock().denied.insert(permission);
    }

    /// Make the next `start_device_scan` return an error.
    pub fn fail_next_scan(&self, message: impl Into<String>) {
        self.inner.lock().fail_next_scan = Some(message.into());
    }

    /// Make the next device scan report an error event before any device.
    pub fn error_next_scan(&self, message: impl Into<String>) {
        self.inner.lock().error_next_scan = Some(message.into());
    }

    /// Whether a device scan is running.
    pub fn is_scanning(&self) -> bool {
        self.inner.lock().active_scan.is_some()
    }

    pub fn stats(&self) -> SimulatorStats {
        self.inner.lock().stats
    }
}

impl BleAdapter for SimulatedAdapter {
    fn adapter_state(&self) -> BoxFuture<'_, AdapterState> {
        Box::pin(async move { self.inner.lock().adapter_state })
    }

    fn request_permissions<'a>(
        &'a self,
        permissions: &'a [Permission],
    ) -> BoxFuture<'a, HashMap<Permission, PermissionStatus>> {
        Box::pin(async move {
            let mut state = self.inner.lock();
            state.stats.permission_requests += 1;
            permissions
                .iter()
                .map(|p| {
                    let status = if state.denied.contains(p) {
                        PermissionStatus::Denied
                    } else {
                        PermissionStatus::Granted
                    };
                    (*p, status)
                })
                .collect()
        })
    }

    fn start_device_scan(&self, _options: &ScanOptions) -> Result<DeviceScanReceiver, AdapterError> {
        let mut state = self.inner.lock();
        if state.stats.destroyed {
            return Err(AdapterError::Destroyed);
        }
        if let Some(message) = state.fail_next_scan.take() {
            return Err(AdapterError::StartScan(message));
        }

        if let Some(previous) = state.active_scan.take() {
            previous.cancel();
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.stats.scans_started += 1;

        if let Some(message) = state.error_next_scan.take() {
            // Receiver is still held here, so the send cannot fail
            let _ = tx.send(DeviceScanEvent::Error(AdapterError::Scan(message)));
            return Ok(rx);
        }

        let token = CancellationToken::new();
        state.active_scan = Some(token.clone());
        drop(state);

        let inner = Arc::clone(&self.inner);
        let advertise_interval = self.advertise_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(advertise_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let batch = inner.lock().advertisements();
                trace!(count = batch.len(), "Simulated advertisement burst");
                for device in batch {
                    if tx.send(DeviceScanEvent::Device(device)).is_err() {
                        return;
                    }
                }
            }
        });

        debug!(interval_ms = advertise_interval.as_millis() as u64, "Simulated scan started");
        Ok(rx)
    }

    fn stop_device_scan(&self) {
        let mut state = self.inner.lock();
        state.stats.scans_stopped += 1;
        if let Some(token) = state.active_scan.take() {
            token.cancel();
        }
    }

    fn destroy(&self) {
        let mut state = self.inner.lock();
        if let Some(token) = state.active_scan.take() {
            token.cancel();
        }
        state.stats.destroyed = true;
        debug!("Simulated adapter destroyed");
    }
}
