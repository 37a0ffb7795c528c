use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::dispatch::SshMode;

const SSH_OPTS: &[&str] = &[
    "-o", "StrictHostKeyChecking=no",
    "-o", "UserKnownHostsFile=/dev/null",
    "-o", "HostKeyAlgorithms=+ssh-rsa",
    "-o", "PubkeyAcceptedKeyTypes=+ssh-rsa",
    "-o", "KexAlgorithms=+diffie-hellman-group14-sha1",
];

#[derive(Debug)]
pub enum SshOutcome {
    Output(String),
    /// The process did not exit within `timeout`. For the reload sequence
    /// this is the expected success path (§4.2); for inventory lookups it
    /// is a genuine failure the caller logs and treats as no output.
    TimedOut,
}

/// Runs `commands` against `mgmt_ip:port` over `sshpass`-wrapped `ssh`,
/// honoring the vendor's transport mode (§4.2). Never returns an `Err`
/// for a remote-side failure — only for being unable to spawn the local
/// child process at all, which the adapter also folds into `None`/`false`.
pub async fn run(
    mgmt_ip: &str,
    port: u16,
    username: &str,
    password: &str,
    mode: SshMode,
    commands: &[&str],
    exec_timeout: Duration,
) -> std::io::Result<SshOutcome> {
    run_with_program("sshpass", mgmt_ip, port, username, password, mode, commands, exec_timeout).await
}

/// `run`'s body with the local binary swappable, so tests can exercise
/// the mode-dependent argument/stdin construction against a harmless
/// stand-in program instead of requiring `sshpass`/`ssh` to be installed.
async fn run_with_program(
    program: &str,
    mgmt_ip: &str,
    port: u16,
    username: &str,
    password: &str,
    mode: SshMode,
    commands: &[&str],
    exec_timeout: Duration,
) -> std::io::Result<SshOutcome> {
    let target = format!("{username}@{mgmt_ip}");
    let port_str = port.to_string();

    let mut cmd = Command::new(program);
    cmd.arg("-p")
        .arg(password)
        .arg("ssh")
        .args(SSH_OPTS)
        .arg("-p")
        .arg(&port_str);

    let stdin_payload = match mode {
        SshMode::SingleShot => {
            cmd.arg(&target).arg(commands[0]);
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).stdin(Stdio::null());
            None
        }
        SshMode::Interactive => {
            cmd.arg("-tt").arg(&target);
            cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
            let mut input = commands.join("\n");
            input.push('\n');
            Some(input)
        }
    };

    spawn_and_await(cmd, stdin_payload, exec_timeout).await
}

/// Spawns `cmd`, streams `stdin_payload` into it if present, then races
/// the exit against `exec_timeout`. `wait_with_output` consumes the
/// child, so on timeout there is no handle left to call `start_kill` on
/// (unlike `reachable`'s bare `wait`) — `kill_on_drop` lets dropping the
/// timed-out future kill the orphaned process instead.
async fn spawn_and_await(
    mut cmd: Command,
    stdin_payload: Option<String>,
    exec_timeout: Duration,
) -> std::io::Result<SshOutcome> {
    cmd.kill_on_drop(true);
    let mut child = cmd.spawn()?;

    if let Some(input) = stdin_payload {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(input.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }
    }

    match timeout(exec_timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            if !output.status.success() {
                tracing::warn!(
                    status = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "ssh command exited non-zero"
                );
            }
            Ok(SshOutcome::Output(String::from_utf8_lossy(&output.stdout).into_owned()))
        }
        Ok(Err(err)) => Err(err),
        Err(_) => Ok(SshOutcome::TimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_shot_mode_runs_command_directly_without_pseudo_tty() {
        let outcome = run_with_program(
            "echo",
            "10.0.0.1",
            22,
            "admin",
            "secret",
            SshMode::SingleShot,
            &["show inventory"],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let SshOutcome::Output(output) = outcome else { panic!("expected Output, got TimedOut") };
        assert!(!output.contains("-tt"), "single-shot mode must not allocate a pseudo-TTY: {output}");
        assert!(output.contains("show inventory"));
    }

    #[tokio::test]
    async fn interactive_mode_allocates_pseudo_tty_and_streams_commands_on_stdin() {
        let outcome = run_with_program(
            "echo",
            "10.0.0.1",
            22,
            "admin",
            "secret",
            SshMode::Interactive,
            &["terminal length 0", "show inventory", "exit"],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let SshOutcome::Output(output) = outcome else { panic!("expected Output, got TimedOut") };
        assert!(output.contains("-tt"), "interactive mode must allocate a pseudo-TTY: {output}");
    }

    #[tokio::test]
    async fn exec_timeout_yields_timed_out_and_kills_the_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5").stdout(Stdio::null()).stderr(Stdio::null());

        let outcome = spawn_and_await(cmd, None, Duration::from_millis(100)).await.unwrap();
        assert!(matches!(outcome, SshOutcome::TimedOut));
    }
}
