use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::data::Config;
use crate::konst::{
    API_BEARER_TOKEN_ENV, CONFIG_DIR_ENV, DEFAULT_CATALOG_FILE, DEFAULT_CREDENTIALS_FILE, TICKET_PATH_ENV,
};

/// Loads `testbed.toml` from `path`, expanding a leading `~`, then applies
/// environment overrides. Missing file is an error: callers that want a
/// default config absent a file should use `Config::default()` directly.
pub fn load_config(path: &str) -> Result<Config> {
    let expanded = shellexpand::tilde(path);
    let contents = fs::read_to_string(expanded.as_ref())
        .with_context(|| format!("reading config file {}", expanded))?;
    let mut config: Config = toml::from_str(&contents)
        .with_context(|| format!("parsing config file {}", expanded))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Writes a fresh default config to `path`, creating parent directories
/// as needed. Used by `testbed-lbd` CLI bootstrap, not by the server itself.
pub fn create_config(path: &str) -> Result<()> {
    let expanded = shellexpand::tilde(path);
    let expanded_path = Path::new(expanded.as_ref());
    if let Some(parent) = expanded_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    let config = Config::default();
    let serialized = toml::to_string_pretty(&config).context("serializing default config")?;
    fs::write(expanded_path, serialized)
        .with_context(|| format!("writing config file {}", expanded))?;
    Ok(())
}

/// `API_BEARER_TOKEN` and `TICKET_PATH` take precedence over the config
/// file when set, matching the teacher's env-overrides-file convention.
/// `CONFIG_DIR` selects where the catalog and credentials files live
/// (§6): when set, it is joined onto `catalog_path`/`credentials_path`,
/// but only while those are still at their bare-filename defaults, so an
/// explicit path in `testbed.toml` is never silently relocated.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(token) = std::env::var(API_BEARER_TOKEN_ENV) {
        if !token.is_empty() {
            config.bearer_token = Some(token);
        }
    }
    if let Ok(ticket_path) = std::env::var(TICKET_PATH_ENV) {
        if !ticket_path.is_empty() {
            config.ticket_path = ticket_path;
        }
    }
    if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
        if !config_dir.is_empty() {
            let dir = Path::new(&config_dir);
            if config.catalog_path == DEFAULT_CATALOG_FILE {
                config.catalog_path = dir.join(DEFAULT_CATALOG_FILE).to_string_lossy().into_owned();
            }
            if config.credentials_path == DEFAULT_CREDENTIALS_FILE {
                config.credentials_path = dir.join(DEFAULT_CREDENTIALS_FILE).to_string_lossy().into_owned();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_parses_minimal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testbed.toml");
        fs::write(&path, "bind_port = 9000\n").unwrap();

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0");
    }

    #[test]
    fn load_config_missing_file_errors() {
        let result = load_config("/nonexistent/testbed.toml");
        assert!(result.is_err());
    }

    #[test]
    fn env_override_takes_precedence_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testbed.toml");
        fs::write(&path, "ticket_path = \"/from/file\"\n").unwrap();

        unsafe {
            std::env::set_var(TICKET_PATH_ENV, "/from/env");
        }
        let config = load_config(path.to_str().unwrap()).unwrap();
        unsafe {
            std::env::remove_var(TICKET_PATH_ENV);
        }
        assert_eq!(config.ticket_path, "/from/env");
    }

    #[test]
    fn config_dir_override_joins_default_catalog_and_credentials_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testbed.toml");
        fs::write(&path, "bind_port = 9000\n").unwrap();

        unsafe {
            std::env::set_var(CONFIG_DIR_ENV, "/etc/testbed");
        }
        let config = load_config(path.to_str().unwrap()).unwrap();
        unsafe {
            std::env::remove_var(CONFIG_DIR_ENV);
        }
        assert_eq!(config.catalog_path, "/etc/testbed/devices.yaml");
        assert_eq!(config.credentials_path, "/etc/testbed/credentials.yaml");
    }

    #[test]
    fn config_dir_override_does_not_relocate_explicit_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testbed.toml");
        fs::write(&path, "catalog_path = \"/custom/devices.yaml\"\n").unwrap();

        unsafe {
            std::env::set_var(CONFIG_DIR_ENV, "/etc/testbed");
        }
        let config = load_config(path.to_str().unwrap()).unwrap();
        unsafe {
            std::env::remove_var(CONFIG_DIR_ENV);
        }
        assert_eq!(config.catalog_path, "/custom/devices.yaml");
        assert_eq!(config.credentials_path, "/etc/testbed/credentials.yaml");
    }
}
