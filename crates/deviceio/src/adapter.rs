use std::time::Duration;

use shared::data::{CredentialsFile, Device};
use shared::konst::{RELOAD_SSH_TIMEOUT_SECS_N9K, SSH_TIMEOUT_SECS};

use crate::dispatch::{self, SshMode};
use crate::reachable::reachable;
use crate::serial::parse_serial;
use crate::ssh::{self, SshOutcome};

/// Owns credentials for the process lifetime and dispatches ping/SSH
/// calls by vendor/model. Every public method is infallible: failures
/// surface as `false`/`None`, never a propagated error (§4.2).
pub struct DeviceAdapter {
    credentials: CredentialsFile,
}

impl DeviceAdapter {
    pub fn new(credentials: CredentialsFile) -> Self {
        Self { credentials }
    }

    pub async fn reachable(&self, mgmt_ip: &str) -> bool {
        reachable(mgmt_ip).await
    }

    /// Looks up the device's serial over SSH. Returns `None` for an
    /// unknown `(vendor, model)` pair or a missing password; returns
    /// `Some("")` when the session succeeded but no known pattern matched
    /// the output (the caller treats this as a serial mismatch).
    pub async fn get_serial(&self, device: &Device) -> Option<String> {
        let (vendor, model) = device.dispatch_key();
        let profile = dispatch::profile_for(&vendor, &model)?;

        let cred = self.credentials.lookup(&device.serial);
        if cred.password.is_empty() {
            tracing::error!(serial = %device.serial, "no credentials for device");
            return None;
        }
        let username = if cred.username.is_empty() { "admin" } else { &cred.username };

        let outcome = ssh::run(
            &device.mgmt_ip,
            device.port,
            username,
            &cred.password,
            profile.ssh_mode,
            profile.inventory_commands,
            Duration::from_secs(SSH_TIMEOUT_SECS),
        )
        .await;

        let output = match outcome {
            Ok(SshOutcome::Output(output)) => output,
            Ok(SshOutcome::TimedOut) => {
                tracing::warn!(serial = %device.serial, "ssh inventory command timed out");
                return None;
            }
            Err(err) => {
                tracing::warn!(serial = %device.serial, address = %device.mgmt_ip, %err, "ssh inventory command failed");
                return None;
            }
        };

        Some(parse_serial(&vendor, &model, &output))
    }

    /// Only `(cisco, n9k)` and `(cisco, c8k)` are resettable today; other
    /// pairs return `false` without attempting a connection (§4.2). A
    /// local timeout during the n9k/c8k reload sequence is the *expected*
    /// success path, since `reload` severs the session before it can
    /// reply.
    pub async fn reset_device(&self, device: &Device) -> bool {
        let (vendor, model) = device.dispatch_key();
        let Some(profile) = dispatch::profile_for(&vendor, &model) else {
            return false;
        };
        if !profile.resettable {
            tracing::info!(vendor, model, "reset not implemented for this platform");
            return false;
        }

        let cred = self.credentials.lookup(&device.serial);
        if cred.password.is_empty() {
            tracing::error!(serial = %device.serial, "no credentials for device");
            return false;
        }
        let username = if cred.username.is_empty() { "admin" } else { &cred.username };

        let commands = ["copy initial.cfg startup-config", "", "reload", "y", ""];
        let outcome = ssh::run(
            &device.mgmt_ip,
            device.port,
            username,
            &cred.password,
            SshMode::Interactive,
            &commands,
            Duration::from_secs(RELOAD_SSH_TIMEOUT_SECS_N9K),
        )
        .await;

        match &outcome {
            Err(err) => tracing::warn!(serial = %device.serial, %err, "reset failed"),
            Ok(SshOutcome::TimedOut) => tracing::info!(serial = %device.serial, "reset triggered (timeout expected)"),
            Ok(SshOutcome::Output(_)) => {}
        }
        reset_outcome(outcome)
    }
}

/// Maps an SSH result to the reset result (§4.2, §9 "subprocess
/// exceptions"): a local timeout on the n9k/c8k reload sequence is the
/// *expected* success path, since `reload` severs the session before it
/// can reply; a real output or a spawn error are handled as themselves.
fn reset_outcome(outcome: std::io::Result<SshOutcome>) -> bool {
    match outcome {
        Ok(SshOutcome::TimedOut) => true,
        Ok(SshOutcome::Output(_)) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_timeout_on_n9k_is_treated_as_success() {
        // A reload severs the SSH session before it can reply, so the
        // local timeout that `ssh::run` reports is the expected path,
        // not a failure.
        assert!(reset_outcome(Ok(SshOutcome::TimedOut)));
    }

    #[test]
    fn reset_with_output_is_success() {
        assert!(reset_outcome(Ok(SshOutcome::Output(String::new()))));
    }

    #[test]
    fn reset_spawn_error_is_failure() {
        let err = std::io::Error::other("spawn failed");
        assert!(!reset_outcome(Err(err)));
    }
}
