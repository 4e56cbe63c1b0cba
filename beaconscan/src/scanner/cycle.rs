//! Periodic scan windows.
//!
//! One loop task runs per scanning session. Each tick of the interval timer
//! opens a window: the adapter's device scan runs for `scan_duration`,
//! matching advertisements are folded into the tracked table, and at the
//! close the table is pruned and a snapshot emitted. Windows never overlap;
//! a window that overruns the interval delays the next tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::config::MIN_SCAN_INTERVAL;
use super::engine::ScannerShared;
use super::events::ErrorCode;
use crate::adapter::{DeviceScanEvent, ScanOptions, ScannedDevice};
use crate::ibeacon::{DecodeError, IBeaconFrame};
use crate::region::{self, BeaconRegion};
use crate::tracking::BeaconObservation;

/// Monotonic "now" that follows tokio's clock, so paused-time tests see
/// the same time as the timers.
pub(super) fn monotonic_now() -> Instant {
    time::Instant::now().into_std()
}

/// Decode the iBeacon frame carried by a device advertisement.
pub fn decode_device(device: &ScannedDevice) -> Result<IBeaconFrame, DecodeError> {
    let data = device
        .manufacturer_data
        .as_deref()
        .ok_or(DecodeError::Missing)?;
    IBeaconFrame::from_base64(data)
}

/// Turn an advertisement into an observation if it is a monitored iBeacon.
pub fn observe_device(
    device: &ScannedDevice,
    regions: &[BeaconRegion],
    seen_at: DateTime<Utc>,
) -> Option<BeaconObservation> {
    let frame = match decode_device(device) {
        Ok(frame) => frame,
        Err(reason) => {
            trace!(device = ?device.id, %reason, "Ignoring advertisement");
            return None;
        }
    };

    let uuid = frame.uuid_string();
    if !region::is_monitored(regions, &uuid, frame.major, frame.minor) {
        trace!(%frame, "Beacon outside monitored regions");
        return None;
    }

    Some(BeaconObservation::from_frame(&frame, device.rssi, seen_at))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Default)]
struct WindowStats {
    devices: usize,
    observations: usize,
    failed: bool,
}

/// Run windows every `period` until `cancel` fires.
pub(super) async fn run_scan_loop(
    shared: Arc<ScannerShared>,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut ticker = time::interval(period.max(MIN_SCAN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if run_window(&shared, &cancel).await == WindowOutcome::Cancelled {
            break;
        }
    }

    debug!("Scan loop stopped");
}

async fn run_window(shared: &ScannerShared, cancel: &CancellationToken) -> WindowOutcome {
    let (duration, regions) = shared.window_settings();
    let deadline = time::sleep(duration);
    tokio::pin!(deadline);

    let mut stats = WindowStats::default();

    match shared.adapter.start_device_scan(&ScanOptions::default()) {
        Ok(mut events) => {
            let mut open = true;
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = &mut deadline => break,
                    event = events.recv(), if open => match event {
                        Some(DeviceScanEvent::Device(device)) => {
                            stats.devices += 1;
                            if let Some(observation) = observe_device(&device, &regions, Utc::now()) {
                                if shared.fold(observation, monotonic_now()) {
                                    stats.observations += 1;
                                }
                            }
                        }
                        Some(DeviceScanEvent::Error(err)) => {
                            stats.failed = true;
                            shared.emit_error(ErrorCode::BeaconScanFailed, err.to_string());
                            break;
                        }
                        // Adapter closed the stream; wait out the window
                        None => open = false,
                    },
                }
            }
        }
        Err(err) => {
            stats.failed = true;
            shared.emit_error(ErrorCode::BeaconScanFailed, err.to_string());
        }
    }

    // Every exit stops the device scan, cancelled windows included
    shared.adapter.stop_device_scan();

    if cancel.is_cancelled() {
        debug!(devices = stats.devices, "Scan window cancelled");
        return WindowOutcome::Cancelled;
    }

    let emitted = shared.finish_window(cancel, monotonic_now());
    debug!(
        devices = stats.devices,
        observations = stats.observations,
        failed = stats.failed,
        tracked = ?emitted,
        "Scan window closed"
    );

    WindowOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const UUID: &str = "f7826da6-4fa2-4e98-8024-bc5b71e0893e";

    fn device(frame: &IBeaconFrame, rssi: Option<i16>) -> ScannedDevice {
        ScannedDevice {
            id: None,
            manufacturer_data: Some(frame.to_base64()),
            rssi,
        }
    }

    fn frame(major: u16, minor: u16) -> IBeaconFrame {
        IBeaconFrame::new(Uuid::parse_str(UUID).unwrap(), major, minor, -59)
    }

    #[test]
    fn test_monitored_beacon_is_observed() {
        let regions = vec![BeaconRegion::new(UUID.to_uppercase())];
        let obs = observe_device(&device(&frame(1, 2), Some(-65)), &regions, Utc::now()).unwrap();

        assert_eq!(obs.uuid, UUID);
        assert_eq!((obs.major, obs.minor), (1, 2));
        assert_eq!(obs.rssi, -65);
        assert!(obs.distance > 0.0);
    }

    #[test]
    fn test_unmonitored_beacon_is_dropped() {
        let regions = vec![BeaconRegion::new(UUID).with_major(9)];
        assert!(observe_device(&device(&frame(1, 2), Some(-65)), &regions, Utc::now()).is_none());
        assert!(observe_device(&device(&frame(1, 2), Some(-65)), &[], Utc::now()).is_none());
    }

    #[test]
    fn test_non_beacon_payloads_are_dropped() {
        let regions = vec![BeaconRegion::new(UUID)];
        let missing = ScannedDevice::default();
        let garbage = ScannedDevice {
            manufacturer_data: Some("%%%".into()),
            ..Default::default()
        };
        let short = ScannedDevice {
            manufacturer_data: Some("TAACFQ==".into()),
            ..Default::default()
        };

        assert_eq!(decode_device(&missing), Err(DecodeError::Missing));
        for d in [&missing, &garbage, &short] {
            assert!(observe_device(d, &regions, Utc::now()).is_none());
        }
    }

    #[test]
    fn test_missing_rssi_uses_default() {
        let regions = vec![BeaconRegion::new(UUID)];
        let obs = observe_device(&device(&frame(1, 1), None), &regions, Utc::now()).unwrap();
        assert_eq!(obs.rssi, crate::tracking::DEFAULT_RSSI);
    }
}
