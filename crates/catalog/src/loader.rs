use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use shared::data::{Credential, CredentialsFile, Device, DeviceStatus};

use crate::raw::{RawCatalog, RawDevice};

/// Parses the device catalog at `path` into a flat, deterministically
/// ordered device list. Tolerates both the hierarchical mapping form and
/// the older `vendors: [...]` list form (§6). New devices default to
/// `available`; the loader never preserves status across reloads — that
/// is the inventory engine's job (§4.3).
pub fn load_catalog(path: &str) -> Result<Vec<Device>> {
    let expanded = shellexpand::tilde(path);
    let contents = fs::read_to_string(expanded.as_ref())
        .with_context(|| format!("reading catalog file {}", expanded))?;
    let raw: RawCatalog = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing catalog file {}", expanded))?;
    Ok(flatten(raw))
}

/// Loads the credentials store at `path`. A missing file is not an error
/// here by itself — `load_credentials_or_default` is the caller-facing
/// wrapper that tolerates an absent file per §6 ("Absent file → empty
/// credentials").
pub fn load_credentials(path: &str) -> Result<CredentialsFile> {
    let expanded = shellexpand::tilde(path);
    let contents = fs::read_to_string(expanded.as_ref())
        .with_context(|| format!("reading credentials file {}", expanded))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing credentials file {}", expanded))
}

pub fn load_credentials_or_default(path: &str) -> CredentialsFile {
    match load_credentials(path) {
        Ok(creds) => creds,
        Err(err) => {
            tracing::warn!(%err, path, "credentials file unavailable, using empty defaults");
            CredentialsFile {
                credentials: HashMap::new(),
                default: Credential::default(),
            }
        }
    }
}

fn flatten(raw: RawCatalog) -> Vec<Device> {
    let mut devices = Vec::new();
    match raw {
        RawCatalog::Hierarchical(by_vendor) => {
            for (vendor, by_model) in by_vendor {
                for (model, by_version) in by_model {
                    for (version, raw_devices) in by_version {
                        collect(&vendor, &model, &version, raw_devices, &mut devices);
                    }
                }
            }
        }
        RawCatalog::List { vendors } => {
            for v in vendors {
                for m in v.models {
                    for ver in m.versions {
                        collect(&v.vendor, &m.model, &ver.version, ver.devices, &mut devices);
                    }
                }
            }
        }
    }
    devices
}

/// Appends devices for one `(vendor, model, version)` subtree onto `out`,
/// which accumulates in catalog order (§4.1) — callers must not reorder
/// it afterward.
fn collect(vendor: &str, model: &str, version: &str, raw_devices: Vec<RawDevice>, out: &mut Vec<Device>) {
    if vendor.is_empty() || model.is_empty() || version.is_empty() {
        tracing::warn!(vendor, model, version, "skipping subtree with blank vendor/model/version");
        return;
    }
    for raw in raw_devices {
        let Some(serial) = raw.serial() else {
            tracing::error!(vendor, model, version, "skipping device missing serial");
            continue;
        };
        let Some(mgmt_ip) = raw.mgmt_ip() else {
            tracing::error!(vendor, model, version, serial, "skipping device missing mgmt_ip");
            continue;
        };
        let Some(port) = raw.port() else {
            tracing::error!(vendor, model, version, serial, "skipping device with missing or unparseable port");
            continue;
        };
        if let Some(existing) = out.iter().position(|d| d.serial == serial) {
            tracing::warn!(serial, "duplicate device serial in catalog, last one wins");
            out.remove(existing);
        }
        out.push(Device {
            serial: serial.to_owned(),
            vendor: vendor.to_owned(),
            model: model.to_owned(),
            version: version.to_owned(),
            mgmt_ip: mgmt_ip.to_owned(),
            port,
            hostname: raw.hostname.clone().unwrap_or_default(),
            default_gateway: raw.default_gateway.clone(),
            netmask: raw.netmask.clone(),
            status: DeviceStatus::Available,
        });
    }
}

/// Derives the `vendor -> model -> [versions]` summary used to validate
/// ticket submissions against known triples (§4.1, §4.5).
pub fn supported_versions(devices: &[Device]) -> HashMap<String, HashMap<String, Vec<String>>> {
    let mut summary: HashMap<String, HashMap<String, Vec<String>>> = HashMap::new();
    for device in devices {
        let models = summary.entry(device.vendor.clone()).or_default();
        let versions = models.entry(device.model.clone()).or_default();
        if !versions.contains(&device.version) {
            versions.push(device.version.clone());
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_hierarchical_form() {
        let yaml = r#"
cisco:
  n9k:
    "9.3":
      - serial: ABC123
        mgmt_ip: 10.0.0.1
        port: 22
"#;
        let raw: RawCatalog = serde_yaml::from_str(yaml).unwrap();
        let devices = flatten(raw);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].serial, "ABC123");
        assert_eq!(devices[0].vendor, "cisco");
        assert_eq!(devices[0].port, 22);
    }

    #[test]
    fn flattens_list_form() {
        let yaml = r#"
vendors:
  - vendor: hp
    models:
      - model: "5945"
        versions:
          - version: "7.1"
            devices:
              - serial: HP001
                ip: 10.0.0.2
                port: 22
"#;
        let raw: RawCatalog = serde_yaml::from_str(yaml).unwrap();
        let devices = flatten(raw);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].serial, "HP001");
        assert_eq!(devices[0].mgmt_ip, "10.0.0.2");
    }

    #[test]
    fn skips_device_with_unparseable_port() {
        let yaml = r#"
cisco:
  n9k:
    "9.3":
      - serial: ABC123
        mgmt_ip: 10.0.0.1
        port: not-a-number
"#;
        let raw: RawCatalog = serde_yaml::from_str(yaml).unwrap();
        let devices = flatten(raw);
        assert!(devices.is_empty());
    }

    #[test]
    fn skips_device_missing_serial() {
        let yaml = r#"
cisco:
  n9k:
    "9.3":
      - mgmt_ip: 10.0.0.1
        port: 22
"#;
        let raw: RawCatalog = serde_yaml::from_str(yaml).unwrap();
        let devices = flatten(raw);
        assert!(devices.is_empty());
    }

    #[test]
    fn preserves_catalog_order_over_serial_order() {
        let yaml = r#"
cisco:
  n9k:
    "9.3":
      - serial: ZZZ
        mgmt_ip: 10.0.0.1
        port: 22
      - serial: AAA
        mgmt_ip: 10.0.0.2
        port: 22
"#;
        let raw: RawCatalog = serde_yaml::from_str(yaml).unwrap();
        let devices = flatten(raw);
        assert_eq!(devices.iter().map(|d| d.serial.as_str()).collect::<Vec<_>>(), vec!["ZZZ", "AAA"]);
    }

    #[test]
    fn duplicate_serial_last_one_wins() {
        let yaml = r#"
cisco:
  n9k:
    "9.3":
      - serial: S1
        mgmt_ip: 10.0.0.1
        port: 22
      - serial: S1
        mgmt_ip: 10.0.0.9
        port: 23
"#;
        let raw: RawCatalog = serde_yaml::from_str(yaml).unwrap();
        let devices = flatten(raw);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].mgmt_ip, "10.0.0.9");
        assert_eq!(devices[0].port, 23);
    }

    #[test]
    fn derives_supported_versions() {
        let devices = vec![Device {
            serial: "ABC".into(),
            vendor: "cisco".into(),
            model: "n9k".into(),
            version: "9.3".into(),
            mgmt_ip: "10.0.0.1".into(),
            port: 22,
            hostname: String::new(),
            default_gateway: None,
            netmask: None,
            status: DeviceStatus::Available,
        }];
        let summary = supported_versions(&devices);
        assert_eq!(summary["cisco"]["n9k"], vec!["9.3".to_string()]);
    }
}
