//! Platform permission model.
//!
//! Desktop and iOS-style platforms grant Bluetooth access statically.
//! Android-style platforms require runtime grants whose set depends on the
//! OS API level.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// API level from which Bluetooth scanning has its own permissions.
pub const BLUETOOTH_PERMISSIONS_API_LEVEL: u32 = 31;

/// API level from which background location must be requested separately.
pub const BACKGROUND_LOCATION_API_LEVEL: u32 = 29;

/// Runtime permission relevant to BLE scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    BluetoothScan,
    BluetoothConnect,
    AccessFineLocation,
    AccessBackgroundLocation,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::BluetoothScan => "BLUETOOTH_SCAN",
            Permission::BluetoothConnect => "BLUETOOTH_CONNECT",
            Permission::AccessFineLocation => "ACCESS_FINE_LOCATION",
            Permission::AccessBackgroundLocation => "ACCESS_BACKGROUND_LOCATION",
        };
        f.write_str(name)
    }
}

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Denied, and the platform will not ask the user again.
    NeverAskAgain,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Host platform the scanner runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// Permissions are granted through static declarations.
    #[default]
    Static,
    /// Permissions are requested at runtime (Android-style).
    Runtime { api_level: u32 },
}

impl Platform {
    /// Permissions that must be granted before scanning.
    ///
    /// Empty for [`Platform::Static`].
    pub fn required_permissions(&self) -> Vec<Permission> {
        match *self {
            Platform::Static => Vec::new(),
            Platform::Runtime { api_level } if api_level >= BLUETOOTH_PERMISSIONS_API_LEVEL => {
                vec![
                    Permission::BluetoothScan,
                    Permission::BluetoothConnect,
                    Permission::AccessFineLocation,
                ]
            }
            Platform::Runtime { api_level } if api_level >= BACKGROUND_LOCATION_API_LEVEL => {
                vec![
                    Permission::AccessFineLocation,
                    Permission::AccessBackgroundLocation,
                ]
            }
            Platform::Runtime { .. } => vec![Permission::AccessFineLocation],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Static => f.write_str("static"),
            Platform::Runtime { api_level } => write!(f, "android:{}", api_level),
        }
    }
}

/// Error parsing a [`Platform`] string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid platform '{0}': expected \"static\" or \"android:<api level>\"")]
pub struct ParsePlatformError(pub String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.eq_ignore_ascii_case("static") {
            return Ok(Platform::Static);
        }

        value
            .strip_prefix("android:")
            .and_then(|level| level.trim().parse::<u32>().ok())
            .map(|api_level| Platform::Runtime { api_level })
            .ok_or_else(|| ParsePlatformError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_platform_needs_nothing() {
        assert!(Platform::Static.required_permissions().is_empty());
    }

    #[test]
    fn test_modern_runtime_permissions() {
        let permissions = Platform::Runtime { api_level: 33 }.required_permissions();
        assert_eq!(
            permissions,
            vec![
                Permission::BluetoothScan,
                Permission::BluetoothConnect,
                Permission::AccessFineLocation
            ]
        );
        assert_eq!(
            Platform::Runtime { api_level: 31 }.required_permissions(),
            permissions
        );
    }

    #[test]
    fn test_background_location_levels() {
        for api_level in [29, 30] {
            assert_eq!(
                Platform::Runtime { api_level }.required_permissions(),
                vec![
                    Permission::AccessFineLocation,
                    Permission::AccessBackgroundLocation
                ]
            );
        }
    }

    #[test]
    fn test_legacy_runtime_permissions() {
        assert_eq!(
            Platform::Runtime { api_level: 28 }.required_permissions(),
            vec![Permission::AccessFineLocation]
        );
    }

    #[test]
    fn test_parse_platform() {
        assert_eq!("static".parse::<Platform>().unwrap(), Platform::Static);
        assert_eq!("STATIC".parse::<Platform>().unwrap(), Platform::Static);
        assert_eq!(
            "android:30".parse::<Platform>().unwrap(),
            Platform::Runtime { api_level: 30 }
        );
        assert!("android:".parse::<Platform>().is_err());
        assert!("ios".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_display_parses_back() {
        for platform in [Platform::Static, Platform::Runtime { api_level: 31 }] {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
    }
}
