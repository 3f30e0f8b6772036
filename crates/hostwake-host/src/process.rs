//! Bounded execution of local tools.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{HostError, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub(crate) struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub(crate) fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout and stderr joined, trimmed.
    pub(crate) fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

/// Run a command to completion or until `limit` elapses.
///
/// The child is killed when the returned future is dropped, so a timeout
/// never leaves a process (or the connection it holds) behind.
pub(crate) async fn run_bounded(mut cmd: Command, limit: Duration) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
        Ok(Err(e)) => Err(HostError::from(e)),
        Err(_) => Err(HostError::Timeout),
    }
}
