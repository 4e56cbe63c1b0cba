//! `decode` command: inspect one manufacturer-data payload.

use beaconscan::ibeacon::IBeaconFrame;
use beaconscan::ranging;
use clap::Args;
use serde_json::json;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Base64-encoded manufacturer-specific data
    payload: String,

    /// RSSI in dBm; adds a distance estimate
    #[arg(long, allow_hyphen_values = true)]
    rssi: Option<i16>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

pub fn run(args: DecodeArgs) -> Result<(), CliError> {
    let frame = IBeaconFrame::from_base64(&args.payload)?;
    let estimate = args
        .rssi
        .map(|rssi| ranging::estimate(f64::from(rssi), frame.tx_power));

    if args.json {
        let mut value = json!({
            "uuid": frame.uuid_string(),
            "major": frame.major,
            "minor": frame.minor,
            "txPower": frame.tx_power,
        });
        if let (Some(rssi), Some((distance, accuracy))) = (args.rssi, estimate) {
            value["rssi"] = json!(rssi);
            value["distance"] = json!(distance);
            value["accuracy"] = json!(accuracy);
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("iBeacon frame");
    println!("  UUID:     {}", frame.uuid_string());
    println!("  Major:    {}", frame.major);
    println!("  Minor:    {}", frame.minor);
    println!("  Tx power: {} dBm", frame.tx_power);
    if let Some((distance, accuracy)) = estimate {
        println!("  Distance: {:.2} m ({})", distance, accuracy);
    }

    Ok(())
}
