//! Tunables for host operations.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for reachability probes.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Number of echo requests per probe.
    #[serde(default = "ProbeConfig::default_count")]
    pub count: u32,

    /// Per-request reply timeout in seconds.
    #[serde(default = "ProbeConfig::default_timeout")]
    pub timeout_seconds: u64,
}

impl ProbeConfig {
    const fn default_count() -> u32 {
        3
    }

    const fn default_timeout() -> u64 {
        1
    }

    /// Upper bound for a whole probe, with slack for process start-up.
    #[must_use]
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.count.max(1)) * self.timeout_seconds.max(1) + 2)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            count: Self::default_count(),
            timeout_seconds: Self::default_timeout(),
        }
    }
}

/// Configuration for remote sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// Remote port.
    #[serde(default = "SshConfig::default_port")]
    pub port: u16,

    /// Connection establishment timeout in seconds.
    #[serde(default = "SshConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Bound for connect plus command execution, in seconds.
    #[serde(default = "SshConfig::default_exec_timeout")]
    pub exec_timeout_seconds: u64,
}

impl SshConfig {
    const fn default_port() -> u16 {
        22
    }

    const fn default_connect_timeout() -> u64 {
        5
    }

    const fn default_exec_timeout() -> u64 {
        15
    }

    /// Get the overall session bound as a `Duration`.
    #[must_use]
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_seconds)
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: Self::default_port(),
            connect_timeout_seconds: Self::default_connect_timeout(),
            exec_timeout_seconds: Self::default_exec_timeout(),
        }
    }
}

/// Configuration for Wake-on-LAN.
#[derive(Debug, Clone, Deserialize)]
pub struct WakeConfig {
    /// Broadcast address and port the magic packet is sent to.
    #[serde(default = "WakeConfig::default_broadcast")]
    pub broadcast_addr: String,
}

impl WakeConfig {
    fn default_broadcast() -> String {
        "255.255.255.255:9".to_string()
    }
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            broadcast_addr: Self::default_broadcast(),
        }
    }
}
