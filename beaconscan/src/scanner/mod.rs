//! Beacon scanning engine.
//!
//! [`BeaconScanner`] owns one scan loop per session. Each loop runs
//! periodic scan windows against a [`BleAdapter`](crate::adapter::BleAdapter),
//! folds matching iBeacon advertisements into the tracked table and emits
//! a sorted [`BeaconsUpdate`] when a window closes.
//!
//! ```text
//! start_scanning ──► permissions ──► power ──► spawn loop
//!                                                  │
//!          ┌───────────── every scan_interval ─────┘
//!          ▼
//!   start_device_scan ──► decode ──► region ──► fold
//!          │
//!   scan_duration elapsed / adapter error
//!          ▼
//!   stop_device_scan ──► evict stale ──► on_beacons_updated
//! ```

mod config;
mod cycle;
mod engine;
mod events;

pub use config::{
    BeaconsCallback, ErrorCallback, ScannerConfig, ScannerConfigUpdate, DEFAULT_SCAN_DURATION,
    DEFAULT_SCAN_INTERVAL, MIN_SCAN_INTERVAL,
};
pub use cycle::{decode_device, observe_device};
pub use engine::BeaconScanner;
pub use events::{BeaconsUpdate, ErrorCode, ScanError};
