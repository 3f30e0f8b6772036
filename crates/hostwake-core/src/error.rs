//! Common error types for hostwake.
//!
//! Parse failures for the value types in this crate. Higher layers surface
//! these to operators as invalid input.

use thiserror::Error;

/// A result type using `IdError`.
pub type Result<T> = std::result::Result<T, IdError>;

/// Errors that can occur when parsing identifiers and host values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The username is empty after normalization.
    #[error("username is empty")]
    EmptyUsername,

    /// The role is not one of `user` or `admin`.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// The OS hint is not recognized.
    #[error("unknown OS hint: {0}")]
    UnknownOsHint(String),

    /// The input is not a valid MAC address.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
}
