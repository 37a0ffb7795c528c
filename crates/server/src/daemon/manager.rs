use anyhow::{bail, Context, Result};
use nix::sys::signal::Signal;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use super::pidfile::{
    ensure_log_dir, ensure_run_dir, is_process_running, read_pid, remove_pid, send_signal,
    verify_not_running, write_pid,
};
use super::server::run_server;
use shared::konst::{TESTBED_BASE_DIR, TESTBED_LBD_LOG_FILE, TESTBED_LBD_PID_FILE, TESTBED_LOG_DIR, TESTBED_RUN_DIR};

fn pid_path() -> String {
    format!("{TESTBED_BASE_DIR}/{TESTBED_RUN_DIR}/{TESTBED_LBD_PID_FILE}")
}

fn log_path() -> String {
    format!("{TESTBED_BASE_DIR}/{TESTBED_LOG_DIR}/{TESTBED_LBD_LOG_FILE}")
}

/// Start the testbed-lbd daemon.
pub async fn start_daemon(foreground: bool) -> Result<()> {
    ensure_run_dir()?;
    ensure_log_dir()?;
    verify_not_running()?;

    if foreground {
        tracing::info!("starting testbed-lbd in foreground mode");
        write_pid(&pid_path())?;
        let result = run_server(true).await;
        remove_pid(&pid_path())?;
        result
    } else {
        tracing::info!("starting testbed-lbd in background mode");

        let exe = std::env::current_exe()?;
        let child = Command::new(exe)
            .arg("--background-child")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn background process")?;

        let child_pid = child.id();
        thread::sleep(Duration::from_millis(500));

        if !is_process_running(child_pid) {
            bail!("failed to start testbed-lbd: process exited immediately");
        }

        tracing::info!(pid = child_pid, "testbed-lbd started successfully");
        Ok(())
    }
}

/// Runs as the spawned background child (invoked by `start_daemon`).
pub async fn run_background_child() -> Result<()> {
    write_pid(&pid_path())?;
    let result = run_server(false).await;
    remove_pid(&pid_path())?;
    result
}

pub fn stop_daemon(force: bool) -> Result<()> {
    let pid = match read_pid(&pid_path())? {
        Some(pid) => pid,
        None => bail!("server is not running"),
    };

    if !is_process_running(pid) {
        tracing::warn!(pid, "server is not running (stale PID file found)");
        remove_pid(&pid_path())?;
        return Ok(());
    }

    tracing::info!(pid, "stopping testbed-lbd");

    if let Err(e) = send_signal(pid, Signal::SIGTERM) {
        if force {
            tracing::warn!(error = %e, "failed to send SIGTERM, trying SIGKILL");
        } else {
            bail!("failed to stop server: {}", e);
        }
    } else {
        let mut waited = 0;
        let wait_interval = 500;
        let max_wait = 10000;

        while waited < max_wait {
            thread::sleep(Duration::from_millis(wait_interval));
            waited += wait_interval;

            if !is_process_running(pid) {
                remove_pid(&pid_path())?;
                tracing::info!("testbed-lbd stopped successfully");
                return Ok(());
            }
        }

        if !force {
            bail!(
                "server did not stop gracefully after {} seconds; use --force to kill it",
                max_wait / 1000
            );
        }
    }

    tracing::warn!("server did not stop gracefully, forcing shutdown with SIGKILL");
    send_signal(pid, Signal::SIGKILL).context("failed to send SIGKILL")?;
    thread::sleep(Duration::from_millis(1000));

    if is_process_running(pid) {
        bail!("failed to kill server process");
    }

    remove_pid(&pid_path())?;
    tracing::info!("testbed-lbd stopped successfully");
    Ok(())
}

pub async fn restart_daemon(foreground: bool) -> Result<()> {
    tracing::info!("restarting testbed-lbd");

    if let Some(pid) = read_pid(&pid_path())? {
        if is_process_running(pid) {
            stop_daemon(false)?;
            thread::sleep(Duration::from_millis(2000));
        } else {
            tracing::debug!("found stale PID file, cleaning up");
            remove_pid(&pid_path())?;
        }
    }

    start_daemon(foreground).await
}

pub fn status_daemon() -> Result<()> {
    match read_pid(&pid_path())? {
        Some(pid) => {
            if is_process_running(pid) {
                tracing::info!(pid, "testbed-lbd is running");
                Ok(())
            } else {
                tracing::warn!("testbed-lbd is not running (stale PID file found)");
                std::process::exit(1);
            }
        }
        None => {
            tracing::info!("testbed-lbd is not running");
            std::process::exit(1);
        }
    }
}

pub fn logs_daemon(follow: bool) -> Result<()> {
    let path = log_path();
    let log_file_path = Path::new(&path);

    if !log_file_path.exists() {
        bail!("log file not found at {}", &path);
    }

    if follow {
        let file = fs::File::open(log_file_path)?;

        let reader = BufReader::new(&file);
        for line in reader.lines() {
            println!("{}", line?);
        }

        loop {
            thread::sleep(Duration::from_millis(100));

            let reader = BufReader::new(&file);
            for line in reader.lines() {
                println!("{}", line?);
            }
        }
    } else {
        let contents = fs::read_to_string(log_file_path).with_context(|| format!("failed to read log file: {path}"))?;
        print!("{}", contents);
        Ok(())
    }
}
