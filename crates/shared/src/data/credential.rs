use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-serial login material, with a single fallback `default` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// The on-disk shape of the credentials YAML file:
/// `{ credentials: { <serial>: {username, password} }, default: {...} }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsFile {
    #[serde(default)]
    pub credentials: HashMap<String, Credential>,
    #[serde(default)]
    pub default: Credential,
}

impl CredentialsFile {
    /// Lookup order: exact serial, else the `default` entry.
    pub fn lookup(&self, serial: &str) -> &Credential {
        self.credentials.get(serial).unwrap_or(&self.default)
    }
}
