//! Configuration inspection commands: `config path` and `config list`.

use std::path::PathBuf;

use beaconscan::config::{config_file_path, ConfigFile};
use clap::Subcommand;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List the parsed configuration
    List {
        /// Read this file instead of the default
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::List { config } => run_list(config),
    }
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(not created; defaults apply)");
    }
    Ok(())
}

fn run_list(path: Option<PathBuf>) -> Result<(), CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(&path)?,
        None => ConfigFile::load()?,
    };

    print!("{}", render(&config));
    Ok(())
}

/// Text listing of every section, in file order.
fn render(config: &ConfigFile) -> String {
    let mut out = String::new();

    out.push_str("[scanner]\n");
    out.push_str(&format!(
        "  scan_interval_ms = {}\n",
        config.scanner.scan_interval.as_millis()
    ));
    out.push_str(&format!(
        "  scan_duration_ms = {}\n",
        config.scanner.scan_duration.as_millis()
    ));
    out.push_str(&format!("  platform = {}\n", config.scanner.platform));

    for region in &config.regions {
        out.push_str(&format!("\n[region.{}]\n", region.name));
        out.push_str(&format!("  match = {}\n", region.region));
    }

    for beacon in &config.beacons {
        let c = &beacon.config;
        out.push_str(&format!("\n[beacon.{}]\n", beacon.name));
        out.push_str(&format!("  id = {}/{}/{}\n", c.uuid, c.major, c.minor));
        out.push_str(&format!(
            "  position = ({}, {}) floor {}\n",
            c.coordinate.latitude, c.coordinate.longitude, c.coordinate.floor
        ));
        out.push_str(&format!("  tx_power = {}\n", beacon.tx_power));
    }

    if config.regions.is_empty() {
        out.push_str("\n(no regions: every beacon is ignored)\n");
    }

    out
}
