//! The `BeaconScanner` lifecycle and queries.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::{ScannerConfig, ScannerConfigUpdate};
use super::cycle;
use super::events::{BeaconsUpdate, ErrorCode, ScanError};
use crate::adapter::{AdapterState, BleAdapter};
use crate::position::{BeaconConfig, BeaconPlacements, Position};
use crate::region::BeaconRegion;
use crate::tracking::{BeaconObservation, BeaconTable};

/// Tracked table plus the flag that gates every mutation of it.
#[derive(Debug, Default)]
struct TrackingState {
    scanning: bool,
    table: BeaconTable,
}

/// State shared between the scanner handle and its scan-loop task.
pub(super) struct ScannerShared {
    pub(super) adapter: Arc<dyn BleAdapter>,
    config: RwLock<ScannerConfig>,
    placements: RwLock<BeaconPlacements>,
    tracking: Mutex<TrackingState>,
}

impl ScannerShared {
    /// Duration and regions for the window about to open.
    pub(super) fn window_settings(&self) -> (std::time::Duration, Vec<BeaconRegion>) {
        let config = self.config.read();
        (config.scan_duration, config.regions.clone())
    }

    /// Fold an observation. Ignored once scanning has stopped.
    pub(super) fn fold(&self, observation: BeaconObservation, now: Instant) -> bool {
        let mut tracking = self.tracking.lock();
        if !tracking.scanning {
            return false;
        }
        tracking.table.fold(observation, now);
        true
    }

    /// Evict stale entries and emit the snapshot.
    ///
    /// Returns the number of beacons emitted, or `None` if the session was
    /// stopped before the window closed.
    pub(super) fn finish_window(&self, cancel: &CancellationToken, now: Instant) -> Option<usize> {
        let update = {
            let mut tracking = self.tracking.lock();
            if !tracking.scanning || cancel.is_cancelled() {
                return None;
            }
            let evicted = tracking.table.evict_stale(now);
            if evicted > 0 {
                debug!(evicted, "Evicted stale beacons");
            }
            BeaconsUpdate {
                beacons: tracking.table.snapshot(),
                timestamp: Utc::now(),
            }
        };

        let count = update.beacons.len();
        let callback = self.config.read().on_beacons_updated.clone();
        if let Some(callback) = callback {
            callback(&update);
        }
        Some(count)
    }

    /// Deliver an error to the error callback.
    pub(super) fn emit_error(&self, code: ErrorCode, message: impl Into<String>) {
        let error = ScanError::new(code, message);
        warn!(code = %error.code, message = %error.message, "Beacon scanner error");

        let callback = self.config.read().on_error.clone();
        if let Some(callback) = callback {
            callback(&error);
        }
    }
}

struct ScanSession {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Scans for iBeacons, tracks them and estimates the listener's position.
///
/// Lifecycle calls are serialised: concurrent `start_scanning` calls start
/// one session. Failures are reported through the configured error callback
/// rather than returned.
///
/// Must be used from within a tokio runtime. Dropping the scanner cancels
/// its scan loop; call [`destroy`](Self::destroy) to also release the
/// adapter.
pub struct BeaconScanner {
    shared: Arc<ScannerShared>,
    session: tokio::sync::Mutex<Option<ScanSession>>,
}

impl BeaconScanner {
    /// Create a scanner over `adapter`.
    pub fn new(adapter: Arc<dyn BleAdapter>, config: ScannerConfig) -> Self {
        let placements = BeaconPlacements::new(config.beacon_configs.iter().cloned());
        Self {
            shared: Arc::new(ScannerShared {
                adapter,
                config: RwLock::new(config),
                placements: RwLock::new(placements),
                tracking: Mutex::new(TrackingState::default()),
            }),
            session: tokio::sync::Mutex::new(None),
        }
    }

    /// Request the permissions the configured platform needs.
    ///
    /// Returns `true` if every one was granted.
    pub async fn request_permissions(&self) -> bool {
        let platform = self.shared.config.read().platform;
        let required = platform.required_permissions();
        if required.is_empty() {
            return true;
        }

        let results = self.shared.adapter.request_permissions(&required).await;
        let denied: Vec<_> = required
            .iter()
            .filter(|p| !results.get(*p).is_some_and(|s| s.is_granted()))
            .collect();

        if denied.is_empty() {
            true
        } else {
            debug!(%platform, ?denied, "Permissions not granted");
            false
        }
    }

    /// Whether the radio is powered on.
    pub async fn is_bluetooth_enabled(&self) -> bool {
        self.shared.adapter.adapter_state().await == AdapterState::PoweredOn
    }

    /// Start periodic scanning. No-op if already scanning.
    ///
    /// Emits [`ErrorCode::PermissionDenied`] or
    /// [`ErrorCode::BluetoothDisabled`] and returns without scanning when
    /// those checks fail.
    pub async fn start_scanning(&self) {
        let mut session = self.session.lock().await;
        if self.is_scanning() {
            info!("Beacon scanning already active");
            return;
        }

        if !self.request_permissions().await {
            self.shared
                .emit_error(ErrorCode::PermissionDenied, "Bluetooth permissions not granted");
            return;
        }

        if !self.is_bluetooth_enabled().await {
            self.shared
                .emit_error(ErrorCode::BluetoothDisabled, "Bluetooth is not enabled");
            return;
        }

        let (interval, duration) = {
            let config = self.shared.config.read();
            (config.scan_interval, config.scan_duration)
        };

        self.shared.tracking.lock().scanning = true;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(cycle::run_scan_loop(
            Arc::clone(&self.shared),
            cancel.clone(),
            interval,
        ));
        *session = Some(ScanSession { cancel, handle });

        info!(
            interval_ms = interval.as_millis() as u64,
            duration_ms = duration.as_millis() as u64,
            "Beacon scanning started"
        );
    }

    /// Stop scanning and forget every tracked beacon. No-op if not scanning.
    ///
    /// Once this returns no further callback is invoked.
    pub async fn stop_scanning(&self) {
        let mut session = self.session.lock().await;
        if !self.is_scanning() {
            return;
        }

        self.shared.adapter.stop_device_scan();
        self.shared.tracking.lock().scanning = false;

        if let Some(ScanSession { cancel, handle }) = session.take() {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "Scan loop ended abnormally");
            }
        }

        self.shared.tracking.lock().table.clear();
        info!("Beacon scanning stopped");
    }

    /// Stop scanning and release the adapter.
    pub async fn destroy(&self) {
        self.stop_scanning().await;
        self.shared.adapter.destroy();
        debug!("Beacon scanner destroyed");
    }

    pub fn is_scanning(&self) -> bool {
        self.shared.tracking.lock().scanning
    }

    /// Apply a partial configuration change.
    pub fn update_config(&self, update: ScannerConfigUpdate) {
        let placements = update
            .beacon_configs
            .as_ref()
            .map(|configs| BeaconPlacements::new(configs.iter().cloned()));

        self.shared.config.write().apply(update);

        if let Some(placements) = placements {
            debug!(count = placements.len(), "Beacon placements replaced");
            *self.shared.placements.write() = placements;
        }
    }

    /// Current configuration.
    pub fn config(&self) -> ScannerConfig {
        self.shared.config.read().clone()
    }

    /// Tracked beacons as last filtered, closest first.
    pub fn tracked_beacons(&self) -> Vec<BeaconObservation> {
        self.shared.tracking.lock().table.snapshot()
    }

    /// Placement of one beacon.
    pub fn beacon_config(&self, uuid: &str, major: u16, minor: u16) -> Option<BeaconConfig> {
        self.shared.placements.read().get(uuid, major, minor).cloned()
    }

    /// Estimate the listener's position from the tracked beacons.
    pub fn calculate_position_from_beacons(&self) -> Option<Position> {
        let beacons = self.tracked_beacons();
        self.shared.placements.read().locate(&beacons)
    }
}

impl Drop for BeaconScanner {
    fn drop(&mut self) {
        // Dropped without stop_scanning: end the loop so no callback outlives us
        if let Some(session) = self.session.get_mut().take() {
            self.shared.tracking.lock().scanning = false;
            session.cancel.cancel();
            self.shared.adapter.stop_device_scan();
            debug!("Beacon scanner dropped while scanning");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::adapter::{
        AdapterError, BoxFuture, DeviceScanReceiver, Permission, PermissionStatus, Platform,
        ScanOptions, SimulatedAdapter, SimulatedBeacon,
    };
    use crate::ibeacon::IBeaconFrame;
    use crate::position::Coordinate;
    use uuid::Uuid;

    const UUID: &str = "f7826da6-4fa2-4e98-8024-bc5b71e0893e";

    type Updates = Arc<Mutex<Vec<BeaconsUpdate>>>;
    type Errors = Arc<Mutex<Vec<ScanError>>>;

    fn sim_beacon(minor: u16, x: f64, y: f64, floor: i32) -> SimulatedBeacon {
        SimulatedBeacon::new(
            IBeaconFrame::new(Uuid::parse_str(UUID).unwrap(), 1, minor, -59),
            Coordinate::new(x, y, floor),
        )
    }

    fn recording_config() -> (ScannerConfig, Updates, Errors) {
        let updates: Updates = Arc::default();
        let errors: Errors = Arc::default();
        let u = Arc::clone(&updates);
        let e = Arc::clone(&errors);
        let config = ScannerConfig::new()
            .with_regions(vec![BeaconRegion::new(UUID)])
            .on_beacons_updated(move |update| u.lock().push(update.clone()))
            .on_error(move |error| e.lock().push(error.clone()));
        (config, updates, errors)
    }

    fn scanner_with(adapter: &SimulatedAdapter, config: ScannerConfig) -> BeaconScanner {
        BeaconScanner::new(Arc::new(adapter.clone()), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_update_per_window() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let (config, updates, errors) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        assert!(scanner.is_scanning());

        // Windows close at 1000, 3000 and 5000 ms
        tokio::time::sleep(Duration::from_millis(5500)).await;
        scanner.stop_scanning().await;

        assert_eq!(updates.lock().len(), 3);
        assert!(errors.lock().is_empty());
        assert!(updates.lock().iter().all(|u| u.beacons.len() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_runs_one_session() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let (config, updates, _) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        scanner.stop_scanning().await;

        assert_eq!(updates.lock().len(), 1);
        assert_eq!(adapter.stats().scans_started, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_stop_is_noop() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let (config, updates, errors) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        scanner.stop_scanning().await;
        let stops = adapter.stats().scans_stopped;
        let seen = updates.lock().len();

        scanner.stop_scanning().await;
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert!(!scanner.is_scanning());
        assert_eq!(adapter.stats().scans_stopped, stops);
        assert_eq!(updates.lock().len(), seen);
        assert!(errors.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_after_stop() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let (config, updates, errors) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        scanner.stop_scanning().await;
        let stops = adapter.stats().scans_stopped;

        scanner.destroy().await;
        tokio::time::sleep(Duration::from_millis(5000)).await;

        let stats = adapter.stats();
        assert!(stats.destroyed);
        assert_eq!(stats.scans_stopped, stops);
        assert!(!adapter.is_scanning());
        assert_eq!(updates.lock().len(), 1);
        assert!(errors.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_scan_loop() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let (config, updates, _) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(scanner);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(updates.lock().len(), 1);
        assert!(!adapter.is_scanning());
        assert_eq!(adapter.stats().scans_started, 1);
    }

    /// Adapter whose next stop call blocks the caller, as a platform call can.
    struct SlowStopAdapter {
        radio: SimulatedAdapter,
        block_next_stop: Mutex<Option<Duration>>,
    }

    impl BleAdapter for SlowStopAdapter {
        fn adapter_state(&self) -> BoxFuture<'_, AdapterState> {
            self.radio.adapter_state()
        }

        fn request_permissions<'a>(
            &'a self,
            permissions: &'a [Permission],
        ) -> BoxFuture<'a, HashMap<Permission, PermissionStatus>> {
            self.radio.request_permissions(permissions)
        }

        fn start_device_scan(
            &self,
            options: &ScanOptions,
        ) -> Result<DeviceScanReceiver, AdapterError> {
            self.radio.start_device_scan(options)
        }

        fn stop_device_scan(&self) {
            let delay = self.block_next_stop.lock().take();
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            self.radio.stop_device_scan();
        }

        fn destroy(&self) {
            self.radio.destroy();
        }
    }

    /// A window that opens while `stop_scanning` is stuck in the adapter's
    /// stop call is itself stopped before `stop_scanning` returns.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_covers_window_opened_during_stop() {
        let radio = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let adapter = Arc::new(SlowStopAdapter {
            radio: radio.clone(),
            block_next_stop: Mutex::new(None),
        });
        let config = ScannerConfig::new()
            .with_regions(vec![BeaconRegion::new(UUID)])
            .with_scan_interval(Duration::from_millis(500))
            .with_scan_duration(Duration::from_millis(300));
        let scanner = BeaconScanner::new(adapter.clone(), config);

        // Windows: 0-300 ms, then 500-800 ms. The stop call below blocks
        // from 400 ms to 650 ms, so the second window is open when the
        // loop is cancelled.
        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        *adapter.block_next_stop.lock() = Some(Duration::from_millis(250));
        scanner.stop_scanning().await;

        assert_eq!(radio.stats().scans_started, 2);
        assert!(!radio.is_scanning());
        assert!(!scanner.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_updates_after_stop() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let (config, updates, _) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        // Stop mid-window
        tokio::time::sleep(Duration::from_millis(2500)).await;
        scanner.stop_scanning().await;
        let seen = updates.lock().len();

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(updates.lock().len(), seen);
        assert_eq!(seen, 1);
        assert!(scanner.tracked_beacons().is_empty());
        assert!(!adapter.is_scanning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_noop() {
        let adapter = SimulatedAdapter::new();
        let scanner = scanner_with(&adapter, ScannerConfig::new());
        scanner.stop_scanning().await;
        assert_eq!(adapter.stats().scans_stopped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_prevents_scanning() {
        let adapter = SimulatedAdapter::new();
        adapter.deny_permission(Permission::BluetoothConnect);
        let (config, _, errors) = recording_config();
        let scanner = scanner_with(
            &adapter,
            config.with_platform(Platform::Runtime { api_level: 33 }),
        );

        scanner.start_scanning().await;

        assert!(!scanner.is_scanning());
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::PermissionDenied);
        assert_eq!(adapter.stats().scans_started, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_legacy_platform_ignores_unrequested_permissions() {
        let adapter = SimulatedAdapter::new();
        adapter.deny_permission(Permission::BluetoothScan);
        let scanner = scanner_with(
            &adapter,
            ScannerConfig::new().with_platform(Platform::Runtime { api_level: 28 }),
        );
        assert!(scanner.request_permissions().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_platform_skips_permission_request() {
        let adapter = SimulatedAdapter::new();
        let scanner = scanner_with(&adapter, ScannerConfig::new());
        assert!(scanner.request_permissions().await);
        assert_eq!(adapter.stats().permission_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bluetooth_disabled_prevents_scanning() {
        let adapter = SimulatedAdapter::new();
        adapter.set_adapter_state(AdapterState::PoweredOff);
        let (config, _, errors) = recording_config();
        let scanner = scanner_with(&adapter, config);

        assert!(!scanner.is_bluetooth_enabled().await);
        scanner.start_scanning().await;

        assert!(!scanner.is_scanning());
        assert_eq!(errors.lock()[0].code, ErrorCode::BluetoothDisabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_window_does_not_stop_the_timer() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        adapter.fail_next_scan("radio busy");
        let (config, updates, errors) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(3500)).await;
        scanner.stop_scanning().await;

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::BeaconScanFailed);
        assert!(errors[0].message.contains("radio busy"));

        // The failed window still closes; the next one sees the beacon
        let updates = updates.lock();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].beacons.is_empty());
        assert_eq!(updates[1].beacons.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_event_ends_window_early() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        adapter.error_next_scan("connection lost");
        let (config, updates, errors) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        // The aborted window emits well before its 1000 ms deadline
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(errors.lock().len(), 1);
        assert_eq!(updates.lock().len(), 1);

        // Next window opens at 2000 ms and closes at 3000 ms
        tokio::time::sleep(Duration::from_millis(3000)).await;
        scanner.stop_scanning().await;
        assert_eq!(updates.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_beacons_are_evicted() {
        let adapter = SimulatedAdapter::new()
            .with_beacons([sim_beacon(1, 1.0, 0.0, 0), sim_beacon(2, 2.0, 0.0, 0)]);
        let (config, updates, _) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(scanner.tracked_beacons().len(), 2);

        adapter.remove_beacon(1, 2);
        // Last heard at ~1000 ms; gone once a window closes past 6000 ms
        tokio::time::sleep(Duration::from_millis(6000)).await;
        scanner.stop_scanning().await;

        let last = updates.lock().last().cloned().unwrap();
        assert_eq!(last.beacons.len(), 1);
        assert_eq!(last.beacons[0].minor, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_sorted_and_filtered() {
        let adapter = SimulatedAdapter::new().with_beacons([
            sim_beacon(1, 6.0, 0.0, 0),
            sim_beacon(2, 0.5, 0.0, 0),
            sim_beacon(3, 2.0, 0.0, 0),
        ]);
        let (config, updates, _) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        scanner.stop_scanning().await;

        let minors: Vec<u16> = updates.lock()[0].beacons.iter().map(|b| b.minor).collect();
        assert_eq!(minors, vec![2, 3, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_region_filter_applies() {
        let other = "00000000-0000-0000-0000-000000000001";
        let adapter = SimulatedAdapter::new().with_beacons([
            sim_beacon(1, 1.0, 0.0, 0),
            SimulatedBeacon::new(
                IBeaconFrame::new(Uuid::parse_str(other).unwrap(), 1, 1, -59),
                Coordinate::new(1.0, 0.0, 0),
            ),
        ]);
        let (config, _, _) = recording_config();
        let scanner = scanner_with(&adapter, config);

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let tracked = scanner.tracked_beacons();
        scanner.stop_scanning().await;

        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].uuid, UUID);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_from_scan() {
        let beacons = [
            sim_beacon(1, 0.0, 0.0, 1),
            sim_beacon(2, 10.0, 0.0, 1),
            sim_beacon(3, 0.0, 10.0, 1),
        ];
        let configs: Vec<BeaconConfig> = beacons
            .iter()
            .map(|b| BeaconConfig::new(UUID, b.frame.major, b.frame.minor, b.coordinate))
            .collect();

        let adapter = SimulatedAdapter::new()
            .with_beacons(beacons)
            .with_listener(Coordinate::new(3.0, 3.0, 1));
        let (config, _, _) = recording_config();
        let scanner = scanner_with(&adapter, config.with_beacon_configs(configs));

        assert!(scanner.calculate_position_from_beacons().is_none());

        scanner.start_scanning().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let position = scanner.calculate_position_from_beacons().unwrap();
        scanner.stop_scanning().await;

        assert_eq!(position.floor, 1);
        assert!(position.x > 0.0 && position.x < 10.0);
        assert!(position.y > 0.0 && position.y < 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_config_rebuilds_placements() {
        let adapter = SimulatedAdapter::new();
        let scanner = scanner_with(&adapter, ScannerConfig::new());
        assert!(scanner.beacon_config(UUID, 1, 1).is_none());

        scanner.update_config(ScannerConfigUpdate {
            beacon_configs: Some(vec![BeaconConfig::new(
                UUID,
                1,
                1,
                Coordinate::new(1.0, 2.0, 3),
            )]),
            ..Default::default()
        });

        let config = scanner.beacon_config(&UUID.to_uppercase(), 1, 1).unwrap();
        assert_eq!(config.coordinate.floor, 3);
        assert_eq!(scanner.config().beacon_configs.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_releases_adapter() {
        let adapter = SimulatedAdapter::new().with_beacons([sim_beacon(1, 1.0, 0.0, 0)]);
        let scanner = scanner_with(&adapter, ScannerConfig::new());

        // Safe without a prior start
        scanner.destroy().await;
        assert!(adapter.stats().destroyed);
    }
}
