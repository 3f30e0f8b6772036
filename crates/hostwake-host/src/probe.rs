//! Reachability probing.

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ProbeConfig;
use crate::error::{HostError, Result};
use crate::process::run_bounded;
use crate::target::HostTarget;

/// Determines whether the remote host is currently powered on.
#[async_trait]
pub trait HostProber: Send + Sync {
    /// Probe the host.
    ///
    /// Returns `Ok(false)` when no probe was answered in time.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NotConfigured` if the target has no address, or
    /// `HostError::Io` if the probe could not be sent at all.
    async fn probe(&self, target: &HostTarget) -> Result<bool>;
}

/// Prober backed by the system `ping` tool.
///
/// `ping` exits with status 0 when at least one echo reply arrived.
#[derive(Debug, Clone, Default)]
pub struct PingProber {
    config: ProbeConfig,
}

impl PingProber {
    /// Create a new prober.
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    fn command(&self, ip: &str) -> Command {
        let count = self.config.count.max(1).to_string();
        let mut cmd = Command::new("ping");
        if cfg!(target_os = "windows") {
            let wait_ms = (self.config.timeout_seconds.max(1) * 1000).to_string();
            cmd.args(["-n", count.as_str(), "-w", wait_ms.as_str(), ip]);
        } else {
            let wait = self.config.timeout_seconds.max(1).to_string();
            cmd.args(["-c", count.as_str(), "-W", wait.as_str(), ip]);
        }
        cmd
    }
}

#[async_trait]
impl HostProber for PingProber {
    async fn probe(&self, target: &HostTarget) -> Result<bool> {
        let ip = target.require_ip()?;

        let reachable = match run_bounded(self.command(ip), self.config.overall_timeout()).await {
            Ok(output) => output.success(),
            Err(HostError::Timeout) => false,
            Err(e) => return Err(e),
        };

        tracing::debug!(ip = %ip, reachable, "Probed host");

        Ok(reachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_without_ip_is_error() {
        let prober = PingProber::default();
        let result = prober.probe(&HostTarget::default()).await;
        assert_eq!(result, Err(HostError::NotConfigured("ip")));
    }

    #[test]
    fn command_uses_configured_count() {
        let prober = PingProber::new(ProbeConfig {
            count: 5,
            timeout_seconds: 2,
        });
        let cmd = prober.command("10.0.0.7");
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"5".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("10.0.0.7"));
    }
}
