//! BeaconScan CLI - Command-line interface
//!
//! Runs the beacon scanner against simulated beacons, decodes iBeacon
//! payloads and inspects configuration.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::decode::DecodeArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "beaconscan")]
#[command(version = beaconscan::VERSION)]
#[command(about = "Indoor positioning from BLE iBeacon advertisements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan simulated beacons placed from the configuration file
    Simulate(SimulateArgs),

    /// Decode base64 manufacturer data as an iBeacon frame
    Decode(DecodeArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Decode(args) => commands::decode::run(args),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
