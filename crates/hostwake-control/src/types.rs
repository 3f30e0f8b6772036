//! Inbound and outbound message types, and engine configuration.

use std::time::Duration;

use hostwake_core::ChatId;
use serde::Deserialize;

use crate::menu::Menu;

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// The sender's chat handle, `None` if the transport has none for them.
    pub caller: Option<String>,
    /// The chat the message arrived in.
    pub chat_id: ChatId,
    /// The message text.
    pub text: String,
}

impl InboundEvent {
    /// Create an event from a sender with a handle.
    #[must_use]
    pub fn new(caller: impl Into<String>, chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            caller: Some(caller.into()),
            chat_id,
            text: text.into(),
        }
    }

    /// Create an event from a sender without a handle.
    #[must_use]
    pub fn anonymous(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            caller: None,
            chat_id,
            text: text.into(),
        }
    }
}

/// A reply to send back to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    /// The chat to reply in.
    pub chat_id: ChatId,
    /// The reply text.
    pub text: String,
    /// Buttons to show with the reply, if any.
    pub menu: Option<Menu>,
}

impl OutboundReply {
    /// A plain text reply.
    #[must_use]
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            menu: None,
        }
    }

    /// A reply that also shows a menu.
    #[must_use]
    pub fn with_menu(chat_id: ChatId, text: impl Into<String>, menu: Menu) -> Self {
        Self {
            chat_id,
            text: text.into(),
            menu: Some(menu),
        }
    }
}

/// Configuration for the conversation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    /// Outer bound on any single probe, power or remote call (seconds).
    ///
    /// Collaborators carry their own tighter bounds; this one only catches a
    /// call that would otherwise hold a chat forever.
    #[serde(default = "ControlConfig::default_operation_timeout")]
    pub operation_timeout_seconds: u64,

    /// Text sent in reply to `/start`.
    #[serde(default = "ControlConfig::default_greeting")]
    pub greeting: String,
}

impl ControlConfig {
    const fn default_operation_timeout() -> u64 {
        30
    }

    fn default_greeting() -> String {
        "👋 Welcome!".to_string()
    }

    /// Get the operation bound as a `Duration`.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            operation_timeout_seconds: Self::default_operation_timeout(),
            greeting: Self::default_greeting(),
        }
    }
}
