use anyhow::{bail, Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::Path;

use shared::konst::{TESTBED_BASE_DIR, TESTBED_LBD_PID_FILE, TESTBED_LOG_DIR, TESTBED_RUN_DIR};

pub fn ensure_run_dir() -> Result<()> {
    let dir = format!("{TESTBED_BASE_DIR}/{TESTBED_RUN_DIR}");
    if !Path::new(&dir).exists() {
        fs::create_dir_all(&dir).with_context(|| format!("creating run directory: {dir}"))?;
    }
    Ok(())
}

pub fn ensure_log_dir() -> Result<()> {
    let dir = format!("{TESTBED_BASE_DIR}/{TESTBED_LOG_DIR}");
    if !Path::new(&dir).exists() {
        fs::create_dir_all(&dir).with_context(|| format!("creating log directory: {dir}"))?;
    }
    Ok(())
}

pub fn write_pid(path: &str) -> Result<()> {
    let pid = std::process::id();
    fs::write(path, pid.to_string()).with_context(|| format!("writing PID file: {path}"))?;
    Ok(())
}

pub fn read_pid(path: &str) -> Result<Option<u32>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("reading PID file: {path}"))?;
    let pid = contents
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid PID in file: {path}"))?;
    Ok(Some(pid))
}

pub fn remove_pid(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        fs::remove_file(path).with_context(|| format!("removing PID file: {path}"))?;
    }
    Ok(())
}

pub fn is_process_running(pid: u32) -> bool {
    let pid = Pid::from_raw(pid as i32);
    kill(pid, None).is_ok()
}

/// Detects and removes a stale PID file (one whose process is gone).
/// Returns whether it was stale.
pub fn check_stale_pidfile(path: &str) -> Result<bool> {
    let Some(pid) = read_pid(path)? else {
        return Ok(false);
    };
    if is_process_running(pid) {
        return Ok(false);
    }
    remove_pid(path)?;
    Ok(true)
}

pub fn verify_not_running() -> Result<()> {
    if let Some(pid) = read_pid(&pid_path())? {
        if is_process_running(pid) {
            bail!("testbed-lbd is already running (PID: {})", pid);
        }
        tracing::warn!("found stale PID file, cleaning up");
        remove_pid(&pid_path())?;
    }
    Ok(())
}

pub fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    let pid = Pid::from_raw(pid as i32);
    kill(pid, signal).with_context(|| format!("sending signal {signal:?} to PID {pid}"))?;
    Ok(())
}

pub fn pid_path() -> String {
    format!("{TESTBED_BASE_DIR}/{TESTBED_RUN_DIR}/{TESTBED_LBD_PID_FILE}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_pid_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let pid_file = temp_dir.path().join("test.pid");
        let pid_path = pid_file.to_str().unwrap();

        write_pid(pid_path).unwrap();
        let read = read_pid(pid_path).unwrap();
        assert_eq!(read, Some(std::process::id()));
    }

    #[test]
    fn read_nonexistent_pid_is_none() {
        let result = read_pid("/tmp/testbed_lbd_nonexistent_pid_12345.pid").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn remove_pid_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let pid_file = temp_dir.path().join("test.pid");
        let pid_path = pid_file.to_str().unwrap();

        write_pid(pid_path).unwrap();
        remove_pid(pid_path).unwrap();
        assert!(!Path::new(pid_path).exists());
        remove_pid(pid_path).unwrap();
    }

    #[test]
    fn is_process_running_detects_current_process() {
        assert!(is_process_running(std::process::id()));
        assert!(!is_process_running(99999));
    }

    #[test]
    fn check_stale_pidfile_detects_and_removes() {
        let temp_dir = TempDir::new().unwrap();
        let pid_file = temp_dir.path().join("test.pid");
        let pid_path = pid_file.to_str().unwrap();

        fs::write(pid_path, "99999").unwrap();
        assert!(check_stale_pidfile(pid_path).unwrap());
        assert!(!Path::new(pid_path).exists());

        write_pid(pid_path).unwrap();
        assert!(!check_stale_pidfile(pid_path).unwrap());
        assert!(Path::new(pid_path).exists());
    }
}
