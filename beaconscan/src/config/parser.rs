//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The only place INI section and key names are mapped to settings.

use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use tracing::debug;
use uuid::Uuid;

use super::file::{
    BeaconSettings, ConfigFile, ConfigFileError, RegionSettings, DEFAULT_TX_POWER,
};
use crate::adapter::Platform;
use crate::position::{BeaconConfig, Coordinate};
use crate::region::BeaconRegion;

const SCANNER_SECTION: &str = "scanner";
const REGION_PREFIX: &str = "region.";
const BEACON_PREFIX: &str = "beacon.";

/// Parse an `Ini` object, overlaying values on the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    for (name, section) in ini.iter() {
        let Some(name) = name else { continue };

        if name == SCANNER_SECTION {
            parse_scanner(name, section, &mut config)?;
        } else if let Some(region_name) = name.strip_prefix(REGION_PREFIX) {
            config.regions.push(RegionSettings {
                name: region_name.to_string(),
                region: parse_region(name, section)?,
            });
        } else if let Some(beacon_name) = name.strip_prefix(BEACON_PREFIX) {
            config.beacons.push(parse_beacon(beacon_name, name, section)?);
        } else {
            debug!(section = name, "Ignoring unknown config section");
        }
    }

    Ok(config)
}

fn parse_scanner(
    name: &str,
    section: &Properties,
    config: &mut ConfigFile,
) -> Result<(), ConfigFileError> {
    if let Some(v) = section.get("scan_interval_ms") {
        config.scanner.scan_interval = parse_millis(name, "scan_interval_ms", v)?;
    }
    if let Some(v) = section.get("scan_duration_ms") {
        config.scanner.scan_duration = parse_millis(name, "scan_duration_ms", v)?;
    }
    if let Some(v) = section.get("platform") {
        config.scanner.platform = Platform::from_str(v).map_err(|_| invalid(
            name,
            "platform",
            v,
            "must be 'static' or 'android:<api level>'",
        ))?;
    }
    Ok(())
}

fn parse_region(name: &str, section: &Properties) -> Result<BeaconRegion, ConfigFileError> {
    let mut region = BeaconRegion::new(parse_uuid(name, section)?);
    if let Some(v) = section.get("major") {
        region = region.with_major(parse_number(name, "major", v, "must be 0-65535")?);
    }
    if let Some(v) = section.get("minor") {
        region = region.with_minor(parse_number(name, "minor", v, "must be 0-65535")?);
    }
    Ok(region)
}

fn parse_beacon(
    beacon_name: &str,
    name: &str,
    section: &Properties,
) -> Result<BeaconSettings, ConfigFileError> {
    let uuid = parse_uuid(name, section)?;
    let major = parse_number(name, "major", required(name, section, "major")?, "must be 0-65535")?;
    let minor = parse_number(name, "minor", required(name, section, "minor")?, "must be 0-65535")?;
    let latitude = parse_coordinate(name, "latitude", required(name, section, "latitude")?)?;
    let longitude = parse_coordinate(name, "longitude", required(name, section, "longitude")?)?;
    let floor = parse_number(name, "floor", required(name, section, "floor")?, "must be an integer")?;

    let tx_power = match section.get("tx_power") {
        Some(v) => parse_number(name, "tx_power", v, "must be -128 to 127 (dBm)")?,
        None => DEFAULT_TX_POWER,
    };

    Ok(BeaconSettings {
        name: beacon_name.to_string(),
        config: BeaconConfig::new(uuid, major, minor, Coordinate::new(latitude, longitude, floor)),
        tx_power,
    })
}

fn required<'a>(name: &str, section: &'a Properties, key: &str) -> Result<&'a str, ConfigFileError> {
    section.get(key).ok_or_else(|| ConfigFileError::MissingKey {
        section: name.to_string(),
        key: key.to_string(),
    })
}

/// UUIDs are stored in canonical lowercase hyphenated form.
fn parse_uuid(name: &str, section: &Properties) -> Result<String, ConfigFileError> {
    let v = required(name, section, "uuid")?;
    Uuid::parse_str(v.trim())
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| invalid(name, "uuid", v, "must be a UUID like f7826da6-4fa2-4e98-8024-bc5b71e0893e"))
}

fn parse_number<T: FromStr>(
    name: &str,
    key: &str,
    v: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    v.trim().parse().map_err(|_| invalid(name, key, v, reason))
}

fn parse_millis(name: &str, key: &str, v: &str) -> Result<Duration, ConfigFileError> {
    match v.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(invalid(name, key, v, "must be a positive integer (milliseconds)")),
    }
}

fn parse_coordinate(name: &str, key: &str, v: &str) -> Result<f64, ConfigFileError> {
    match v.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(name, key, v, "must be a finite number")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
