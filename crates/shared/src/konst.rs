pub const TESTBED_BASE_DIR: &str = "/opt/testbed-lbd";
pub const TESTBED_CONFIG_FILE: &str = "testbed.toml";
pub const TESTBED_CONFIG_DIR: &str = "config";
pub const TESTBED_RUN_DIR: &str = "run";
pub const TESTBED_LOG_DIR: &str = "logs";
pub const TESTBED_LBD_PID_FILE: &str = "testbed-lbd.pid";
pub const TESTBED_LBD_LOG_FILE: &str = "testbed-lbd.log";

pub const DEFAULT_CATALOG_FILE: &str = "devices.yaml";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.yaml";
pub const DEFAULT_TICKET_PATH: &str = "/opt/testbed-lbd/tickets";

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_BIND_PORT: u16 = 8000;

pub const PING_TIMEOUT_SECS: u64 = 1;
pub const SSH_TIMEOUT_SECS: u64 = 10;
pub const RELOAD_SSH_TIMEOUT_SECS_N9K: u64 = 3;

pub const DEFAULT_RECONCILER_INTERVAL_SECS: u64 = 10;

pub const API_BEARER_TOKEN_ENV: &str = "API_BEARER_TOKEN";
pub const CONFIG_DIR_ENV: &str = "CONFIG_DIR";
pub const TICKET_PATH_ENV: &str = "TICKET_PATH";

pub const TICKET_ACTIVE_DIR: &str = "active";
pub const TICKET_ARCHIVE_DIR: &str = "archive";

/// Simulated pre-job reset delay for the background ticket task. Standing
/// in for a real per-job device reset, which happens for real later, on
/// release.
pub const SIMULATED_RESET_DELAY_SECS: u64 = 1;
/// Simulated job duration for the background ticket task.
pub const SIMULATED_JOB_DURATION_SECS: u64 = 5;
