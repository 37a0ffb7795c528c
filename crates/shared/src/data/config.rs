use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::konst::{
    DEFAULT_BIND_PORT, DEFAULT_CATALOG_FILE, DEFAULT_CREDENTIALS_FILE,
    DEFAULT_RECONCILER_INTERVAL_SECS, DEFAULT_TICKET_PATH,
};

/// `testbed.toml` on-disk configuration. `CONFIG_DIR`, `API_BEARER_TOKEN`
/// and `TICKET_PATH` environment variables override the corresponding
/// fields when present (see `shared::util::config::apply_env_overrides`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: Ipv4Addr,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_ticket_path")]
    pub ticket_path: String,
    #[serde(default = "default_reconciler_interval")]
    pub reconciler_interval_secs: u64,
}

fn default_bind_addr() -> Ipv4Addr {
    Ipv4Addr::new(0, 0, 0, 0)
}

fn default_bind_port() -> u16 {
    DEFAULT_BIND_PORT
}

fn default_catalog_path() -> String {
    DEFAULT_CATALOG_FILE.to_owned()
}

fn default_credentials_path() -> String {
    DEFAULT_CREDENTIALS_FILE.to_owned()
}

fn default_ticket_path() -> String {
    DEFAULT_TICKET_PATH.to_owned()
}

fn default_reconciler_interval() -> u64 {
    DEFAULT_RECONCILER_INTERVAL_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            bind_port: default_bind_port(),
            bearer_token: None,
            catalog_path: default_catalog_path(),
            credentials_path: default_credentials_path(),
            ticket_path: default_ticket_path(),
            reconciler_interval_secs: default_reconciler_interval(),
        }
    }
}
