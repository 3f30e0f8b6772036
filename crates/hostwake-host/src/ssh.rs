//! One-shot remote command execution.
//!
//! Each call opens a fresh `ssh` connection, runs exactly one command and
//! tears the connection down again, whatever the outcome. There is no
//! connection reuse; every query pays the full handshake.
//!
//! Password authentication goes through `sshpass -e`, which reads the secret
//! from the `SSHPASS` environment variable of the child process, so the
//! secret never appears on a command line or in a log line.

use std::sync::Arc;

use async_trait::async_trait;
use hostwake_core::OsHint;
use tokio::process::Command;

use crate::config::SshConfig;
use crate::error::{HostError, Result};
use crate::process::run_bounded;
use crate::target::HostTarget;

/// The commands the bot knows how to run remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteQuery {
    /// Time since boot.
    Uptime,
    /// Power the host off immediately.
    Shutdown,
}

impl RemoteQuery {
    /// The command line for the given OS family.
    #[must_use]
    pub const fn command_for(self, os: OsHint) -> &'static str {
        match (self, os) {
            (Self::Uptime, OsHint::Windows) => {
                "powershell -NoProfile -Command \"$b=(Get-CimInstance Win32_OperatingSystem).LastBootUpTime; $u=(Get-Date)-$b; 'up {0}d {1}h {2}m (since {3})' -f $u.Days,$u.Hours,$u.Minutes,$b\""
            }
            (Self::Uptime, OsHint::Other) => "uptime",
            (Self::Shutdown, OsHint::Windows) => "shutdown /s /t 0",
            (Self::Shutdown, OsHint::Other) => "sudo -n shutdown -h now",
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uptime => "uptime",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Runs a single command on the remote host.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Open a session, run `query`, close the session and return its output.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Unreachable`, `AuthFailed`, `Timeout` or
    /// `Unknown` depending on how the session failed, and
    /// `HostError::NotConfigured` if the target lacks an address or login.
    async fn run_query(&self, target: &HostTarget, query: RemoteQuery) -> Result<String>;
}

#[async_trait]
impl<T: RemoteSession + ?Sized> RemoteSession for Arc<T> {
    async fn run_query(&self, target: &HostTarget, query: RemoteQuery) -> Result<String> {
        (**self).run_query(target, query).await
    }
}

/// Remote session client backed by the system `ssh` tool.
#[derive(Debug, Clone, Default)]
pub struct SshSessionClient {
    config: SshConfig,
}

impl SshSessionClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn command(&self, target: &HostTarget, remote_command: &str) -> Result<Command> {
        let ip = target.require_ip()?;
        let user = target.require_ssh_user()?;

        let mut cmd = match target.ssh_secret.as_deref() {
            Some(secret) => {
                let mut c = Command::new("sshpass");
                c.arg("-e").env("SSHPASS", secret).arg("ssh");
                c.args(["-o", "PreferredAuthentications=password,keyboard-interactive"]);
                c.args(["-o", "NumberOfPasswordPrompts=1"]);
                c
            }
            None => {
                let mut c = Command::new("ssh");
                c.args(["-o", "BatchMode=yes"]);
                c
            }
        };

        let connect_timeout = format!("ConnectTimeout={}", self.config.connect_timeout_seconds);
        let port = self.config.port.to_string();
        let destination = format!("{user}@{ip}");

        cmd.args(["-o", connect_timeout.as_str()])
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .args(["-p", port.as_str()])
            .arg(destination)
            .arg(remote_command);

        Ok(cmd)
    }
}

#[async_trait]
impl RemoteSession for SshSessionClient {
    async fn run_query(&self, target: &HostTarget, query: RemoteQuery) -> Result<String> {
        let cmd = self.command(target, query.command_for(target.os_hint))?;
        let ip = target.require_ip()?;

        tracing::debug!(ip = %ip, query = query.as_str(), "Opening remote session");

        let output = match run_bounded(cmd, self.config.exec_timeout()).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(ip = %ip, query = query.as_str(), error = %e, "Remote session failed");
                return Err(e);
            }
        };

        if output.success() {
            tracing::info!(ip = %ip, query = query.as_str(), "Remote query succeeded");
            Ok(output.combined())
        } else {
            let error = classify_failure(output.code, &output.stderr);
            tracing::warn!(
                ip = %ip,
                query = query.as_str(),
                exit_code = ?output.code,
                error = %error,
                "Remote query failed"
            );
            Err(error)
        }
    }
}

/// Map a failed `ssh`/`sshpass` exit into the error taxonomy.
fn classify_failure(code: Option<i32>, stderr: &str) -> HostError {
    let lower = stderr.to_ascii_lowercase();

    // sshpass: 5 = wrong password
    if code == Some(5) || lower.contains("permission denied") {
        return HostError::AuthFailed;
    }
    if lower.contains("timed out") {
        return HostError::Timeout;
    }
    if [
        "connection refused",
        "no route to host",
        "network is unreachable",
        "could not resolve",
        "host is down",
    ]
    .iter()
    .any(|needle| lower.contains(needle))
    {
        return HostError::Unreachable;
    }

    let detail = stderr.trim();
    if detail.is_empty() {
        HostError::Unknown(format!("exit status {code:?}"))
    } else {
        HostError::Unknown(detail.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(secret: Option<&str>) -> HostTarget {
        HostTarget {
            mac: None,
            ip: Some("10.0.0.5".to_string()),
            ssh_user: Some("owner".to_string()),
            ssh_secret: secret.map(str::to_string),
            os_hint: OsHint::Other,
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn classify_auth_failures() {
        assert_eq!(classify_failure(Some(5), ""), HostError::AuthFailed);
        assert_eq!(
            classify_failure(Some(255), "owner@10.0.0.5: Permission denied (password)."),
            HostError::AuthFailed
        );
    }

    #[test]
    fn classify_network_failures() {
        assert_eq!(
            classify_failure(Some(255), "ssh: connect to host 10.0.0.5 port 22: Connection timed out"),
            HostError::Timeout
        );
        assert_eq!(
            classify_failure(Some(255), "ssh: connect to host 10.0.0.5 port 22: Connection refused"),
            HostError::Unreachable
        );
        assert_eq!(
            classify_failure(Some(255), "ssh: Could not resolve hostname pc: Name or service not known"),
            HostError::Unreachable
        );
    }

    #[test]
    fn classify_other_failures() {
        assert_eq!(
            classify_failure(Some(1), "uptime: command not found\n"),
            HostError::Unknown("uptime: command not found".to_string())
        );
        assert!(matches!(classify_failure(None, ""), HostError::Unknown(_)));
    }

    #[test]
    fn password_goes_through_environment() {
        let client = SshSessionClient::default();
        let cmd = client.command(&target(Some("hunter2")), "uptime").unwrap();

        assert_eq!(cmd.as_std().get_program(), "sshpass");
        assert!(!args(&cmd).iter().any(|a| a.contains("hunter2")));
        assert!(cmd
            .as_std()
            .get_envs()
            .any(|(k, v)| k == "SSHPASS" && v.is_some_and(|v| v == "hunter2")));
    }

    #[test]
    fn key_auth_uses_batch_mode() {
        let client = SshSessionClient::default();
        let cmd = client.command(&target(None), "uptime").unwrap();

        assert_eq!(cmd.as_std().get_program(), "ssh");
        let args = args(&cmd);
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"owner@10.0.0.5".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("uptime"));
    }

    #[test]
    fn missing_login_is_not_configured() {
        let client = SshSessionClient::default();
        let mut t = target(None);
        t.ssh_user = None;
        assert!(matches!(
            client.command(&t, "uptime"),
            Err(HostError::NotConfigured("ssh_user"))
        ));
    }

    #[test]
    fn queries_depend_on_os() {
        assert_eq!(RemoteQuery::Uptime.command_for(OsHint::Other), "uptime");
        assert!(RemoteQuery::Uptime
            .command_for(OsHint::Windows)
            .contains("LastBootUpTime"));
        assert_eq!(
            RemoteQuery::Shutdown.command_for(OsHint::Windows),
            "shutdown /s /t 0"
        );
    }
}
