//! Error types for the conversation engine.
//!
//! Every error ends up as exactly one reply to the operator; see
//! [`ControlError::user_message`].

use hostwake_core::{IdError, Role};
use hostwake_host::HostError;
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur while handling an inbound event.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The caller has no directory record.
    #[error("access denied for caller {0}")]
    AccessDenied(String),

    /// The caller's role is not sufficient for the requested action.
    #[error("role check failed: requires {required}, caller is {actual}")]
    RoleCheckFailed {
        /// The role the action needs.
        required: Role,
        /// The role the caller has.
        actual: Role,
    },

    /// The operator typed something the current step cannot accept.
    ///
    /// The message is shown to the operator as is.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The host target is missing a field the action needs.
    #[error("host not configured: {0}")]
    NotConfigured(String),

    /// The remote uptime query failed.
    #[error("remote uptime query failed: {0}")]
    UptimeUnavailable(HostError),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] hostwake_store::StoreError),

    /// Host operation error.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Returns the reply text shown to the operator for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AccessDenied(_) => "⛔ You have no access.".to_string(),
            Self::RoleCheckFailed { .. } => "⛔ Admins only.".to_string(),
            Self::InvalidInput(msg) => format!("⚠️ {msg}"),
            Self::NotConfigured(_) | Self::Host(HostError::NotConfigured(_)) => {
                "⚠️ The PC is not configured yet. Set its MAC and IP address first.".to_string()
            }
            Self::UptimeUnavailable(_) => "❌ Could not retrieve uptime.".to_string(),
            Self::Host(HostError::Unreachable) => "🔌 The PC is off or unreachable.".to_string(),
            Self::Host(HostError::Timeout) => "⏱ The PC did not answer in time.".to_string(),
            Self::Host(_) => "❌ The command failed.".to_string(),
            Self::Store(_) | Self::Internal(_) => {
                "❌ Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Store(_) | Self::Internal(_) => true,
            Self::Host(e) | Self::UptimeUnavailable(e) => e.is_retriable(),
            _ => false,
        }
    }
}

impl From<IdError> for ControlError {
    fn from(err: IdError) -> Self {
        let msg = match err {
            IdError::EmptyUsername => "Invalid username.",
            IdError::UnknownRole(_) => "Invalid role. Expected user or admin.",
            IdError::InvalidMac(_) => "Invalid MAC address. Expected AA:BB:CC:DD:EE:FF.",
            IdError::UnknownOsHint(_) => "Invalid OS. Expected windows or other.",
        };
        Self::InvalidInput(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages() {
        assert!(ControlError::AccessDenied("bob".to_string())
            .user_message()
            .contains("no access"));
        assert!(ControlError::RoleCheckFailed {
            required: Role::Admin,
            actual: Role::User
        }
        .user_message()
        .contains("Admins only"));
        assert_eq!(
            ControlError::InvalidInput("Invalid role.".to_string()).user_message(),
            "⚠️ Invalid role."
        );
        assert_eq!(
            ControlError::Host(HostError::NotConfigured("mac")).user_message(),
            ControlError::NotConfigured("mac".to_string()).user_message()
        );
    }

    #[test]
    fn remote_failures_share_one_message() {
        let messages: Vec<String> = [
            HostError::AuthFailed,
            HostError::Timeout,
            HostError::Unreachable,
            HostError::Unknown("boom".to_string()),
        ]
        .into_iter()
        .map(|e| ControlError::UptimeUnavailable(e).user_message())
        .collect();

        assert!(messages.iter().all(|m| m == "❌ Could not retrieve uptime."));
    }

    #[test]
    fn id_errors_become_invalid_input() {
        let err = ControlError::from(IdError::UnknownRole("manager".to_string()));
        assert!(matches!(err, ControlError::InvalidInput(ref m) if m.contains("user or admin")));
        assert!(!err.is_retriable());
    }

    #[test]
    fn retriable_errors() {
        assert!(ControlError::Host(HostError::Timeout).is_retriable());
        assert!(!ControlError::Host(HostError::AuthFailed).is_retriable());
        assert!(ControlError::Internal("x".to_string()).is_retriable());
        assert!(!ControlError::AccessDenied("x".to_string()).is_retriable());
    }
}
