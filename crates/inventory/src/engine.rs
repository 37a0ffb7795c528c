use std::collections::HashMap;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tokio::sync::Mutex;

use catalog::{load_catalog, load_credentials_or_default, supported_versions};
use deviceio::DeviceAdapter;
use shared::data::{Device, DeviceStatus};
use shared::error::{InventoryError, ReleaseResult};

/// The canonical device map and its single engine-wide mutex (§4.3, §5).
/// The mutex is never held across an adapter call: every method that
/// needs device I/O releases it before the call and reacquires it only
/// to commit the resulting transition. `IndexMap`, not `HashMap`: §4.1
/// requires list and reservation order to follow catalog order, and a
/// `HashMap`'s iteration order has no relation to insertion order.
pub struct Inventory {
    devices: Mutex<IndexMap<String, Device>>,
    supported: Mutex<HashMap<String, HashMap<String, Vec<String>>>>,
    adapter: DeviceAdapter,
    catalog_path: String,
}

impl Inventory {
    pub async fn load(catalog_path: &str, credentials_path: &str) -> Result<Self> {
        let devices = load_catalog(catalog_path).context("loading device catalog")?;
        let credentials = load_credentials_or_default(credentials_path);
        let supported = supported_versions(&devices);
        let by_serial = devices.into_iter().map(|d| (d.serial.clone(), d)).collect();

        Ok(Self {
            devices: Mutex::new(by_serial),
            supported: Mutex::new(supported),
            adapter: DeviceAdapter::new(credentials),
            catalog_path: catalog_path.to_owned(),
        })
    }

    /// Derived `vendor -> model -> [versions]` map used to validate ticket
    /// submissions (§4.1, §4.5).
    pub async fn supported_versions(&self) -> HashMap<String, HashMap<String, Vec<String>>> {
        self.supported.lock().await.clone()
    }

    /// Fans `refresh_machine_status` out over every device in parallel.
    /// Per-device failures are isolated; the call resolves once every
    /// refresh has resolved, regardless of order (§4.3).
    pub async fn initialize_status(&self) {
        let serials: Vec<String> = self.devices.lock().await.keys().cloned().collect();
        let refreshes = serials.iter().map(|serial| self.refresh_machine_status(serial));
        futures::future::join_all(refreshes).await;
    }

    /// Pings the device; if reachable, compares its SSH-reported serial
    /// against the recorded one (case-insensitive, trimmed) and sets
    /// `available` on a match or `unavailable` on a mismatch. This is the
    /// only path that re-enters `available` (§4.3).
    pub async fn refresh_machine_status(&self, serial: &str) {
        let Some(device) = self.devices.lock().await.get(serial).cloned() else {
            return;
        };

        if !self.adapter.reachable(&device.mgmt_ip).await {
            self.set_status(serial, DeviceStatus::Unreachable).await;
            return;
        }

        let reported = self.adapter.get_serial(&device).await.unwrap_or_default();
        let matches = reported.trim().eq_ignore_ascii_case(device.serial.trim());
        self.set_status(serial, if matches { DeviceStatus::Available } else { DeviceStatus::Unavailable }).await;
    }

    /// One reconciler tick: three ordered sweeps over devices in the
    /// matching starting status, each probing reachability and never the
    /// serial (§4.4). `unavailable` devices are never touched — they are
    /// presumed in use.
    pub async fn reconcile_pass(&self) {
        self.sweep(DeviceStatus::Unreachable, |reachable| {
            if reachable { Some(DeviceStatus::Available) } else { None }
        })
        .await;
        self.sweep(DeviceStatus::Available, |reachable| {
            if reachable { None } else { Some(DeviceStatus::Unreachable) }
        })
        .await;
        self.sweep(DeviceStatus::Rebooting, |reachable| {
            if reachable { None } else { Some(DeviceStatus::Unreachable) }
        })
        .await;
    }

    async fn sweep(&self, from: DeviceStatus, decide: impl Fn(bool) -> Option<DeviceStatus>) {
        let candidates: Vec<(String, String)> = self
            .devices
            .lock()
            .await
            .values()
            .filter(|d| d.status == from)
            .map(|d| (d.serial.clone(), d.mgmt_ip.clone()))
            .collect();

        for (serial, mgmt_ip) in candidates {
            let reachable = self.adapter.reachable(&mgmt_ip).await;
            if let Some(next) = decide(reachable) {
                let mut devices = self.devices.lock().await;
                if let Some(device) = devices.get_mut(&serial) {
                    if device.status == from {
                        device.status = next;
                    }
                }
            }
        }
    }

    pub async fn list_machines(
        &self,
        vendor: Option<&str>,
        model: Option<&str>,
        version: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<Device>, InventoryError> {
        let status_filter = match status {
            Some(s) => Some(s.parse::<DeviceStatus>().map_err(|_| InventoryError::UnknownStatus(s.to_owned()))?),
            None => None,
        };

        let devices = self.devices.lock().await;
        Ok(devices
            .values()
            .filter(|d| vendor.is_none_or(|v| d.vendor == v))
            .filter(|d| model.is_none_or(|m| d.model == m))
            .filter(|d| version.is_none_or(|ver| d.version == ver))
            .filter(|d| status_filter.is_none_or(|s| d.status == s))
            .cloned()
            .collect())
    }

    pub async fn get_machine(&self, serial: &str) -> Option<Device> {
        self.devices.lock().await.get(serial).cloned()
    }

    /// First-fit reservation in catalog order, with a reachability
    /// double-check that releases the mutex for the I/O and reacquires it
    /// to commit (§4.3, §5's "only subtle rule"). No load-balancing
    /// across otherwise-equal devices: the first matching device in
    /// catalog order wins, never the serial-alphabetical first.
    pub async fn reserve_machine(&self, vendor: &str, model: &str, version: &str) -> Option<Device> {
        loop {
            let candidate = {
                let devices = self.devices.lock().await;
                devices
                    .values()
                    .find(|d| d.matches_triple(vendor, model, version) && d.status == DeviceStatus::Available)
                    .cloned()
            };

            let Some(device) = candidate else {
                return None;
            };

            if self.adapter.reachable(&device.mgmt_ip).await {
                let mut devices = self.devices.lock().await;
                if let Some(entry) = devices.get_mut(&device.serial) {
                    if entry.status != DeviceStatus::Available {
                        // Raced with another reservation between the snapshot and
                        // the commit; try again from the top.
                        continue;
                    }
                    entry.status = DeviceStatus::Unavailable;
                    return Some(entry.clone());
                }
                return None;
            } else {
                self.set_status(&device.serial, DeviceStatus::Unreachable).await;
                continue;
            }
        }
    }

    /// `NOT_FOUND` / `ALREADY_AVAILABLE` / `UNREACHABLE` are decided
    /// without touching the network. Only the reset path calls the
    /// adapter, and only after the mutex is released (§4.3, §5).
    pub async fn release_machine(&self, serial: &str) -> ReleaseResult {
        let device = {
            let devices = self.devices.lock().await;
            match devices.get(serial) {
                None => return ReleaseResult::NotFound,
                Some(d) if d.status == DeviceStatus::Available => return ReleaseResult::AlreadyAvailable,
                Some(d) if d.status == DeviceStatus::Unreachable => return ReleaseResult::Unreachable,
                Some(d) => d.clone(),
            }
        };

        if self.adapter.reset_device(&device).await {
            self.set_status(serial, DeviceStatus::Rebooting).await;
            ReleaseResult::Success
        } else {
            ReleaseResult::Failed
        }
    }

    /// Re-reads the catalog, preserving in-memory status for serials that
    /// survive and defaulting new ones to `available`. Non-destructive:
    /// this is why reservation state lives in memory rather than being
    /// derived from the catalog file on every read (§4.3).
    pub async fn reload_machines(&self) -> Result<usize> {
        let fresh = load_catalog(&self.catalog_path).context("reloading device catalog")?;
        let fresh_supported = supported_versions(&fresh);

        let mut devices = self.devices.lock().await;
        let previous: IndexMap<String, Device> = std::mem::take(&mut *devices);

        let mut next = IndexMap::with_capacity(fresh.len());
        for mut device in fresh {
            if let Some(existing) = previous.get(&device.serial) {
                device.status = existing.status;
            } else {
                tracing::info!(serial = %device.serial, "catalog reload: new device");
            }
            next.insert(device.serial.clone(), device);
        }
        for serial in previous.keys() {
            if !next.contains_key(serial) {
                tracing::info!(serial, "catalog reload: device removed");
            }
        }

        let total = next.len();
        *devices = next;
        drop(devices);
        *self.supported.lock().await = fresh_supported;
        Ok(total)
    }

    async fn set_status(&self, serial: &str, status: DeviceStatus) {
        let mut devices = self.devices.lock().await;
        if let Some(device) = devices.get_mut(serial) {
            device.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_catalog(dir: &std::path::Path, body: &str) -> String {
        let path = dir.join("devices.yaml");
        fs::write(&path, body).unwrap();
        path.to_str().unwrap().to_owned()
    }

    fn write_credentials(dir: &std::path::Path) -> String {
        let path = dir.join("credentials.yaml");
        fs::write(&path, "default:\n  username: admin\n  password: secret\n").unwrap();
        path.to_str().unwrap().to_owned()
    }

    async fn load_fixture(dir: &std::path::Path) -> Inventory {
        let catalog_path = write_catalog(
            dir,
            r#"
acme:
  foo:
    "1.0":
      - serial: S1
        mgmt_ip: 127.0.0.1
        port: 22
      - serial: S2
        mgmt_ip: 127.0.0.1
        port: 22
"#,
        );
        let credentials_path = write_credentials(dir);
        Inventory::load(&catalog_path, &credentials_path).await.unwrap()
    }

    #[tokio::test]
    async fn list_machines_filters_by_vendor_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let inv = load_fixture(dir.path()).await;

        let all = inv.list_machines(None, None, None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let unknown_status = inv.list_machines(None, None, None, Some("bogus")).await;
        assert!(unknown_status.is_err());
    }

    #[tokio::test]
    async fn release_unknown_serial_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let inv = load_fixture(dir.path()).await;
        assert_eq!(inv.release_machine("does-not-exist").await, ReleaseResult::NotFound);
    }

    #[tokio::test]
    async fn release_already_available_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let inv = load_fixture(dir.path()).await;
        assert_eq!(inv.release_machine("S1").await, ReleaseResult::AlreadyAvailable);
    }

    #[tokio::test]
    async fn reserve_picks_first_match_in_catalog_order_not_serial_order() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = write_catalog(
            dir.path(),
            r#"
acme:
  foo:
    "1.0":
      - serial: ZZZ
        mgmt_ip: 127.0.0.1
        port: 22
      - serial: AAA
        mgmt_ip: 127.0.0.1
        port: 22
"#,
        );
        let credentials_path = write_credentials(dir.path());
        let inv = Inventory::load(&catalog_path, &credentials_path).await.unwrap();

        let reserved = inv.reserve_machine("acme", "foo", "1.0").await.unwrap();
        assert_eq!(reserved.serial, "ZZZ");
    }

    #[tokio::test]
    async fn reload_preserves_status_for_existing_serials() {
        let dir = tempfile::tempdir().unwrap();
        let inv = load_fixture(dir.path()).await;

        let reserved = inv.reserve_machine("acme", "foo", "1.0").await;
        assert!(reserved.is_some());
        let reserved_serial = reserved.unwrap().serial;

        write_catalog(
            dir.path(),
            r#"
acme:
  foo:
    "1.0":
      - serial: S1
        mgmt_ip: 127.0.0.1
        port: 22
      - serial: S2
        mgmt_ip: 127.0.0.1
        port: 22
      - serial: S3
        mgmt_ip: 127.0.0.1
        port: 22
"#,
        );

        let total = inv.reload_machines().await.unwrap();
        assert_eq!(total, 3);

        let reserved_device = inv.get_machine(&reserved_serial).await.unwrap();
        assert_eq!(reserved_device.status, DeviceStatus::Unavailable);

        let new_device = inv.get_machine("S3").await.unwrap();
        assert_eq!(new_device.status, DeviceStatus::Available);
    }
}
