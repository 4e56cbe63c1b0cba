//! CLI command implementations.
//!
//! - [`config`] - Configuration inspection (path, list)
//! - [`decode`] - Single payload decoding
//! - [`simulate`] - Scanner run over simulated beacons

pub mod config;
pub mod decode;
pub mod simulate;
