use serde::{Deserialize, Serialize};
use std::fmt;

/// The finite status machine a device occupies. Transitions are driven by
/// the inventory engine and the reconciler, never set directly by a
/// handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Available,
    Unavailable,
    Unreachable,
    Rebooting,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Unreachable => "unreachable",
            Self::Rebooting => "rebooting",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for DeviceStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "unavailable" => Ok(Self::Unavailable),
            "unreachable" => Ok(Self::Unreachable),
            "rebooting" => Ok(Self::Rebooting),
            _ => Err(()),
        }
    }
}

/// A single device in the fleet: identity, vendor classification,
/// connection info, and mutable status.
///
/// `serial` is the reservation key and must be globally unique; the
/// catalog loader warns (last write wins) on collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub vendor: String,
    pub model: String,
    pub version: String,
    pub mgmt_ip: String,
    pub port: u16,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub default_gateway: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    pub status: DeviceStatus,
}

impl Device {
    /// Whether this device matches the given `(vendor, model, version)`
    /// triple. Comparisons are case-sensitive per spec.
    pub fn matches_triple(&self, vendor: &str, model: &str, version: &str) -> bool {
        self.vendor == vendor && self.model == model && self.version == version
    }

    /// Lower-cased `(vendor, model)` pair used to key vendor-specific
    /// dispatch tables in the device I/O adapter.
    pub fn dispatch_key(&self) -> (String, String) {
        (self.vendor.to_lowercase(), self.model.to_lowercase())
    }
}
