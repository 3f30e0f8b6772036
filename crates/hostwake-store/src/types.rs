//! Domain types stored in the database.
//!
//! These types represent the persisted state of the operator directory and
//! the host target overrides.

use chrono::{DateTime, Utc};
use hostwake_core::{Role, Username};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// An operator record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Normalized username, the unique key.
    pub username: Username,
    /// Access role.
    pub role: Role,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A host target field that can be persisted as an override.
///
/// The SSH secret has no field here: it only comes from the
/// environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostField {
    /// Hardware address used for Wake-on-LAN.
    Mac,
    /// Network address used for probing and remote sessions.
    Ip,
    /// Remote login name.
    SshUser,
    /// Operating system family.
    OsHint,
}

impl HostField {
    /// All persistable fields.
    pub const ALL: [Self; 4] = [Self::Mac, Self::Ip, Self::SshUser, Self::OsHint];

    /// Return the field name used as the storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mac => "mac",
            Self::Ip => "ip",
            Self::SshUser => "ssh_user",
            Self::OsHint => "os_hint",
        }
    }
}

impl FromStr for HostField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| StoreError::Serialization(format!("unknown host field: {s}")))
    }
}

impl fmt::Display for HostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
