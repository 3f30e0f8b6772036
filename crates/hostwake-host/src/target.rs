//! The controlled host.

use std::fmt;

use hostwake_core::{MacAddress, OsHint};

use crate::error::{HostError, Result};

/// Everything needed to reach and control the remote host.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HostTarget {
    /// Hardware address for Wake-on-LAN.
    pub mac: Option<MacAddress>,
    /// Network address (IP or resolvable name).
    pub ip: Option<String>,
    /// Remote login name.
    pub ssh_user: Option<String>,
    /// Remote login password. Never logged.
    pub ssh_secret: Option<String>,
    /// Operating system family.
    pub os_hint: OsHint,
}

impl HostTarget {
    /// Returns true if the host can be probed and woken.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.mac.is_some() && self.ip.as_deref().is_some_and(|ip| !ip.trim().is_empty())
    }

    /// Return the network address.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NotConfigured` if no address is set.
    pub fn require_ip(&self) -> Result<&str> {
        self.ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .ok_or(HostError::NotConfigured("ip"))
    }

    /// Return the hardware address.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NotConfigured` if no MAC is set.
    pub fn require_mac(&self) -> Result<MacAddress> {
        self.mac.ok_or(HostError::NotConfigured("mac"))
    }

    /// Return the remote login name.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NotConfigured` if no login name is set.
    pub fn require_ssh_user(&self) -> Result<&str> {
        self.ssh_user
            .as_deref()
            .filter(|user| !user.is_empty())
            .ok_or(HostError::NotConfigured("ssh_user"))
    }
}

impl fmt::Debug for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTarget")
            .field("mac", &self.mac)
            .field("ip", &self.ip)
            .field("ssh_user", &self.ssh_user)
            .field("ssh_secret", &self.ssh_secret.as_ref().map(|_| "<redacted>"))
            .field("os_hint", &self.os_hint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> HostTarget {
        HostTarget {
            mac: Some("AA:BB:CC:DD:EE:FF".parse().unwrap()),
            ip: Some("192.168.1.20".to_string()),
            ssh_user: Some("owner".to_string()),
            ssh_secret: Some("hunter2".to_string()),
            os_hint: OsHint::Windows,
        }
    }

    #[test]
    fn configured_requires_mac_and_ip() {
        assert!(configured().is_configured());

        let mut no_ip = configured();
        no_ip.ip = Some("  ".to_string());
        assert!(!no_ip.is_configured());
        assert_eq!(no_ip.require_ip(), Err(HostError::NotConfigured("ip")));

        let mut no_mac = configured();
        no_mac.mac = None;
        assert!(!no_mac.is_configured());
        assert_eq!(no_mac.require_mac(), Err(HostError::NotConfigured("mac")));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", configured());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
