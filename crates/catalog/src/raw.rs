use indexmap::IndexMap;
use serde::Deserialize;

/// Either on-disk shape the catalog loader must tolerate (§6). Untagged so
/// serde picks whichever variant matches the document's actual keys.
///
/// The hierarchical form uses `IndexMap`, not `HashMap`: §4.1 requires
/// catalog order to be preserved end to end, and a `HashMap`'s iteration
/// order bears no relation to the YAML mapping's key order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawCatalog {
    Hierarchical(IndexMap<String, IndexMap<String, IndexMap<String, Vec<RawDevice>>>>),
    List { vendors: Vec<RawVendor> },
}

#[derive(Debug, Deserialize)]
pub struct RawVendor {
    pub vendor: String,
    #[serde(default)]
    pub models: Vec<RawModel>,
}

#[derive(Debug, Deserialize)]
pub struct RawModel {
    pub model: String,
    #[serde(default)]
    pub versions: Vec<RawVersion>,
}

#[derive(Debug, Deserialize)]
pub struct RawVersion {
    pub version: String,
    #[serde(default)]
    pub devices: Vec<RawDevice>,
}

/// A single device descriptor as it appears in either catalog shape. Every
/// field is optional at parse time so the loader can log a precise reason
/// for skipping a malformed entry instead of failing the whole document.
#[derive(Debug, Deserialize)]
pub struct RawDevice {
    pub serial: Option<String>,
    pub serial_number: Option<String>,
    pub mgmt_ip: Option<String>,
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<serde_yaml::Value>,
    pub hostname: Option<String>,
    pub default_gateway: Option<String>,
    pub netmask: Option<String>,
}

impl RawDevice {
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref().or(self.serial_number.as_deref())
    }

    pub fn mgmt_ip(&self) -> Option<&str> {
        self.mgmt_ip.as_deref().or(self.ip.as_deref())
    }

    /// `port` must parse as an integer in `[0, 65535]`; anything else is
    /// treated as unparseable per §4.1.
    pub fn port(&self) -> Option<u16> {
        match self.port.as_ref()? {
            serde_yaml::Value::Number(n) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
            serde_yaml::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}
