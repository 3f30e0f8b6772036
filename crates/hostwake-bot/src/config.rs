//! Command line and environment configuration.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hostwake_core::{MacAddress, OsHint, Username};
use hostwake_host::{HostTarget, ProbeConfig, SshConfig, WakeConfig};

/// hostwake - wake, shut down and query one PC from a Telegram chat.
#[derive(Parser)]
#[command(name = "hostwake")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Telegram bot token.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Directory for the RocksDB database.
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// MAC address of the controlled PC.
    #[arg(long, env = "HOST_MAC")]
    pub host_mac: Option<String>,

    /// IP address or hostname of the controlled PC.
    #[arg(long, env = "HOST_IP")]
    pub host_ip: Option<String>,

    /// Login name for remote sessions.
    #[arg(long, env = "SSH_USER")]
    pub ssh_user: Option<String>,

    /// Password for remote sessions. Key authentication is used when unset.
    #[arg(long, env = "SSH_PASSWORD", hide_env_values = true)]
    pub ssh_password: Option<String>,

    /// Operating system of the controlled PC (`windows` or `other`).
    #[arg(long, env = "HOST_OS", default_value = "other")]
    pub host_os: String,

    /// Broadcast address for Wake-on-LAN packets.
    #[arg(long, env = "WOL_BROADCAST", default_value = "255.255.255.255:9")]
    pub wol_broadcast: String,

    /// Echo requests per reachability probe.
    #[arg(long, env = "PROBE_COUNT", default_value_t = 3)]
    pub probe_count: u32,

    /// Reply timeout per echo request, in seconds.
    #[arg(long, env = "PROBE_TIMEOUT_SECS", default_value_t = 1)]
    pub probe_timeout_secs: u64,

    /// Connection timeout for remote sessions, in seconds.
    #[arg(long, env = "SSH_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    pub ssh_connect_timeout_secs: u64,

    /// Overall bound for one remote command, in seconds.
    #[arg(long, env = "SSH_EXEC_TIMEOUT_SECS", default_value_t = 15)]
    pub ssh_exec_timeout_secs: u64,

    /// Username granted the admin role at start-up.
    #[arg(long, env = "BOOTSTRAP_ADMIN")]
    pub bootstrap_admin: Option<String>,

    /// Address for the health endpoint; disabled when unset.
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,
}

impl Args {
    /// The host target as configured at start-up.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAC address or OS does not parse.
    pub fn host_target(&self) -> anyhow::Result<HostTarget> {
        let mac = self
            .host_mac
            .as_deref()
            .filter(|mac| !mac.trim().is_empty())
            .map(str::parse::<MacAddress>)
            .transpose()
            .context("HOST_MAC is not a valid MAC address")?;

        let os_hint: OsHint = self
            .host_os
            .parse()
            .context("HOST_OS must be windows or other")?;

        Ok(HostTarget {
            mac,
            ip: non_empty(self.host_ip.as_deref()),
            ssh_user: non_empty(self.ssh_user.as_deref()),
            ssh_secret: non_empty(self.ssh_password.as_deref()),
            os_hint,
        })
    }

    /// The admin to bootstrap, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the username does not parse.
    pub fn admin_to_bootstrap(&self) -> anyhow::Result<Option<Username>> {
        non_empty(self.bootstrap_admin.as_deref())
            .map(|name| Username::parse(&name))
            .transpose()
            .context("BOOTSTRAP_ADMIN is not a valid username")
    }

    /// Probe settings.
    #[must_use]
    pub const fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            count: self.probe_count,
            timeout_seconds: self.probe_timeout_secs,
        }
    }

    /// Remote session settings.
    #[must_use]
    pub fn ssh_config(&self) -> SshConfig {
        SshConfig {
            connect_timeout_seconds: self.ssh_connect_timeout_secs,
            exec_timeout_seconds: self.ssh_exec_timeout_secs,
            ..SshConfig::default()
        }
    }

    /// Wake-on-LAN settings.
    #[must_use]
    pub fn wake_config(&self) -> WakeConfig {
        WakeConfig {
            broadcast_addr: self.wol_broadcast.clone(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["hostwake", "--bot-token", "123:abc"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.probe_config().count, 3);
        assert_eq!(args.ssh_config().exec_timeout_seconds, 15);
        assert_eq!(args.ssh_config().port, 22);
        assert_eq!(args.wake_config().broadcast_addr, "255.255.255.255:9");

        let target = args.host_target().unwrap();
        assert!(!target.is_configured());
        assert_eq!(target.os_hint, OsHint::Other);
    }

    #[test]
    fn host_target_from_flags() {
        let args = parse(&[
            "--host-mac",
            "58-11-22-bd-08-df",
            "--host-ip",
            "192.168.1.20",
            "--ssh-user",
            "owner",
            "--ssh-password",
            "hunter2",
            "--host-os",
            "Windows",
        ]);

        let target = args.host_target().unwrap();
        assert!(target.is_configured());
        assert_eq!(target.mac.unwrap().to_string(), "58:11:22:BD:08:DF");
        assert_eq!(target.ssh_secret.as_deref(), Some("hunter2"));
        assert_eq!(target.os_hint, OsHint::Windows);
    }

    #[test]
    fn bad_mac_is_an_error() {
        let args = parse(&["--host-mac", "58:11:22"]);
        assert!(args.host_target().is_err());
    }

    #[test]
    fn bootstrap_admin_is_normalized() {
        let args = parse(&["--bootstrap-admin", "@Owner"]);
        assert_eq!(
            args.admin_to_bootstrap().unwrap().unwrap().as_str(),
            "owner"
        );
        assert!(parse(&[]).admin_to_bootstrap().unwrap().is_none());
    }
}
