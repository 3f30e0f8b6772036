//! Facts about the machine the bot runs on.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{HostError, Result};
use crate::process::run_bounded;

/// Queries answered by the bot's own machine rather than the remote host.
#[async_trait]
pub trait LocalInfo: Send + Sync {
    /// The local network addresses, space separated.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Io` or `HostError::Unknown` if the query failed.
    async fn addresses(&self) -> Result<String>;

    /// Human readable uptime of the local machine.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Io` or `HostError::Unknown` if the query failed.
    async fn uptime(&self) -> Result<String>;
}

/// Local info backed by `hostname -I` and `uptime`.
#[derive(Debug, Clone)]
pub struct ShellLocalInfo {
    timeout: Duration,
}

impl ShellLocalInfo {
    /// Create with the given per-query bound.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(program);
        cmd.args(args);

        let output = run_bounded(cmd, self.timeout).await?;
        if output.success() {
            Ok(output.stdout.trim().to_string())
        } else {
            tracing::warn!(program, exit_code = ?output.code, "Local query failed");
            Err(HostError::Unknown(output.combined()))
        }
    }
}

impl Default for ShellLocalInfo {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl LocalInfo for ShellLocalInfo {
    async fn addresses(&self) -> Result<String> {
        self.run("hostname", &["-I"]).await
    }

    async fn uptime(&self) -> Result<String> {
        self.run("uptime", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_is_unknown_error() {
        let info = ShellLocalInfo::default();
        let result = info.run("sh", &["-c", "echo broken >&2; exit 2"]).await;
        assert_eq!(result, Err(HostError::Unknown("broken".to_string())));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_is_trimmed() {
        let info = ShellLocalInfo::default();
        let result = info.run("sh", &["-c", "echo '  10.0.0.2 fd00::2  '"]).await;
        assert_eq!(result.unwrap(), "10.0.0.2 fd00::2");
    }
}
