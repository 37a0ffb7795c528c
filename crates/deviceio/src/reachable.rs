use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use shared::konst::PING_TIMEOUT_SECS;

/// A single ICMP echo with a ≤1s timeout. Any spawn failure, non-zero
/// exit, or local timeout is reported as unreachable (§4.2) — the adapter
/// never propagates this as an error.
pub async fn reachable(ip: &str) -> bool {
    probe("ping", &["-c", "1", "-W", "1", ip], Duration::from_secs(PING_TIMEOUT_SECS)).await
}

/// `reachable`'s body with the command swappable, so tests can stand in
/// a deliberately slow process for a delayed ICMP reply instead of
/// depending on real network conditions.
async fn probe(program: &str, args: &[&str], probe_timeout: Duration) -> bool {
    let spawn = Command::new(program).args(args).stdout(Stdio::null()).stderr(Stdio::null()).spawn();

    let mut child = match spawn {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!(program, %err, "failed to spawn probe");
            return false;
        }
    };

    match timeout(probe_timeout, child.wait()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(err)) => {
            tracing::warn!(program, %err, "probe wait failed");
            false
        }
        Err(_) => {
            let _ = child.start_kill();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delayed_reply_past_timeout_is_unreachable() {
        // Stands in for an ICMP echo that answers after 2s: a 1s probe
        // timeout must report unreachable rather than wait it out.
        let reachable = probe("sleep", &["2"], Duration::from_secs(PING_TIMEOUT_SECS)).await;
        assert!(!reachable);
    }

    #[tokio::test]
    async fn prompt_reply_within_timeout_is_reachable() {
        let reachable = probe("true", &[], Duration::from_secs(PING_TIMEOUT_SECS)).await;
        assert!(reachable);
    }
}
