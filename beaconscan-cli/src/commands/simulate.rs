//! `simulate` command: run the scanner over simulated beacons.
//!
//! Virtual beacons are the `[beacon.*]` placements from the configuration
//! file. Each completed scan window prints the tracked beacons and the
//! estimated listener position.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use beaconscan::adapter::SimulatedAdapter;
use beaconscan::position::{Coordinate, Position};
use beaconscan::region::BeaconRegion;
use beaconscan::scanner::{BeaconScanner, BeaconsUpdate, ScanError, ScannerConfig};
use clap::Args;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Configuration file (default: ~/.beaconscan/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many scan windows (default: run until Ctrl+C)
    #[arg(long)]
    windows: Option<usize>,

    /// Print one JSON object per window
    #[arg(long)]
    json: bool,

    /// Listener x (latitude axis)
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    listener_x: f64,

    /// Listener y (longitude axis)
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    listener_y: f64,

    /// Listener floor
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    listener_floor: i32,

    /// Uniform RSSI noise amplitude in dB
    #[arg(long, default_value = "2.0")]
    noise: f64,

    /// Noise generator seed
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Override the scan interval (ms)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Override the scan window length (ms)
    #[arg(long)]
    duration_ms: Option<u64>,
}

enum ScanEvent {
    Update(BeaconsUpdate),
    Error(ScanError),
}

pub fn run(args: SimulateArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), !args.json)?;
    runner.log_startup("simulate");

    let file = runner.config();
    if file.beacons.is_empty() {
        return Err(CliError::Usage(
            "No [beacon.*] sections configured; nothing to simulate".to_string(),
        ));
    }

    let mut config = file.scanner_config();
    if config.regions.is_empty() {
        config.regions = regions_for_placements(&config);
        warn!(
            regions = config.regions.len(),
            "No regions configured; monitoring every configured beacon UUID"
        );
    }
    if let Some(ms) = args.interval_ms {
        config.scan_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = args.duration_ms {
        config.scan_duration = Duration::from_millis(ms);
    }

    let listener = Coordinate::new(args.listener_x, args.listener_y, args.listener_floor);
    let adapter = SimulatedAdapter::new()
        .with_beacons(file.simulated_beacons())
        .with_listener(listener)
        .with_noise(args.noise, args.seed);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    runtime.block_on(simulate(adapter, config, &args))
}

/// One region per distinct placement UUID.
fn regions_for_placements(config: &ScannerConfig) -> Vec<BeaconRegion> {
    config
        .beacon_configs
        .iter()
        .map(|c| c.uuid.to_ascii_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(BeaconRegion::new)
        .collect()
}

async fn simulate(
    adapter: SimulatedAdapter,
    config: ScannerConfig,
    args: &SimulateArgs,
) -> Result<(), CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let error_tx = tx.clone();
    let config = config
        .on_beacons_updated(move |update| {
            let _ = tx.send(ScanEvent::Update(update.clone()));
        })
        .on_error(move |error| {
            let _ = error_tx.send(ScanEvent::Error(error.clone()));
        });

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || signal.cancel())
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let scanner = BeaconScanner::new(Arc::new(adapter), config);
    scanner.start_scanning().await;

    if !scanner.is_scanning() {
        // Start-up failures arrive through the error callback
        return match rx.try_recv() {
            Ok(ScanEvent::Error(error)) => Err(CliError::Scan(error)),
            _ => Err(CliError::Runtime("Scanner did not start".to_string())),
        };
    }

    if !args.json {
        println!("Scanning simulated beacons. Press Ctrl+C to stop.");
        println!();
    }

    let mut windows = 0usize;
    let result = loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            event = rx.recv() => event,
        };

        match event {
            Some(ScanEvent::Update(update)) => {
                windows += 1;
                let position = scanner.calculate_position_from_beacons();
                if let Err(e) = print_window(windows, &update, position, args.json) {
                    break Err(e);
                }
                if args.windows.is_some_and(|limit| windows >= limit) {
                    break Ok(());
                }
            }
            Some(ScanEvent::Error(error)) => {
                if args.json {
                    warn!(code = %error.code, "{}", error.message);
                } else {
                    println!("! {}", error);
                }
            }
            None => break Ok(()),
        }
    };

    scanner.destroy().await;
    info!(windows, "Simulation finished");
    result
}

fn print_window(
    window: usize,
    update: &BeaconsUpdate,
    position: Option<Position>,
    json: bool,
) -> Result<(), CliError> {
    if json {
        let line = json!({
            "window": window,
            "timestamp": update.timestamp,
            "beacons": update.beacons,
            "position": position,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!(
        "Window {} at {} ({} beacons)",
        window,
        update.timestamp.format("%H:%M:%S%.3f"),
        update.beacons.len()
    );
    for beacon in &update.beacons {
        println!(
            "  {}/{:<5} {:>5} dBm {:>7.2} m  {}",
            beacon.major, beacon.minor, beacon.rssi, beacon.distance, beacon.accuracy
        );
    }
    match position {
        Some(position) => println!("  Position: {}", position),
        None => println!("  Position: (need 3 placed beacons)"),
    }
    println!();

    Ok(())
}
