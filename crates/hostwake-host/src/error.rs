//! Error types for host operations.

use thiserror::Error;

/// A result type using `HostError`.
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while talking to the controlled host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// A required host target field is not set.
    #[error("host target is missing {0}")]
    NotConfigured(&'static str),

    /// The host could not be reached.
    #[error("host unreachable")]
    Unreachable,

    /// The remote session rejected the credentials.
    #[error("remote authentication failed")]
    AuthFailed,

    /// The operation did not finish within its bound.
    #[error("operation timed out")]
    Timeout,

    /// The remote side failed for another reason.
    #[error("remote error: {0}")]
    Unknown(String),

    /// A local I/O error (spawning a tool, opening a socket).
    #[error("io error: {0}")]
    Io(String),
}

impl HostError {
    /// Returns true if this error might be resolved by retrying later.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Unreachable | Self::Timeout | Self::Io(_))
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
