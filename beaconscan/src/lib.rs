//! BeaconScan - indoor positioning from BLE iBeacon advertisements
//!
//! This library turns raw BLE advertisements into a filtered table of nearby
//! iBeacons and estimates the listener's position from known beacon placements.
//!
//! # Architecture
//!
//! ```text
//! BleAdapter ──► scan window ──► ibeacon decode ──► region filter
//!                                                        │
//!                     BeaconsUpdate ◄── BeaconTable ◄────┘
//!                     (sorted)          (low-pass RSSI, eviction)
//!                                            │
//!                                            ▼
//!                                  BeaconPlacements::locate ──► Position
//! ```
//!
//! The radio itself is an external collaborator injected through the
//! [`adapter::BleAdapter`] trait. [`adapter::SimulatedAdapter`] implements it
//! in-process for tests and the CLI.

pub mod adapter;
pub mod config;
pub mod ibeacon;
pub mod logging;
pub mod position;
pub mod ranging;
pub mod region;
pub mod scanner;
pub mod tracking;

/// Crate version, for banners and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
