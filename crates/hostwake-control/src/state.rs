//! Per-chat conversation state machine.
//!
//! This module defines the states a chat can be in, the valid transitions
//! between them and the validation used by the engine before any state is
//! replaced.
//!
//! # State Machine
//!
//! ```text
//!                 ┌──────────────────────────┐
//!                 │           Main           │◄────────── /start, Back,
//!                 └──────────────────────────┘            lapsed, demoted
//!                   │ (PC control)    │ (Admin panel)
//!                   ▼                 ▼
//!           ┌─────────────┐   ┌───────────────────────────────────────┐
//!           │  PcControl  │   │                 Admin                 │◄──┐
//!           └─────────────┘   └───────────────────────────────────────┘   │
//!                               │ (Add user) │ (Remove) │ (Role) │ (MAC)  │
//!                               ▼            ▼          ▼        ▼        │
//!                         AddUsername   RemoveUser  RoleUsername NewMac ──┤
//!                               │                       │                 │
//!                               ▼                       ▼                 │
//!                           AddRole ──────────────── NewRole ─────────────┘
//! ```
//!
//! Every state other than `Main` belongs to an admin-only menu.

use std::fmt;

use hostwake_core::{ChatId, Username};

use crate::error::{ControlError, Result};

/// Flat identifier for a chat state, without any flow fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateTag {
    /// Top-level menu.
    Main,
    /// Host power menu.
    PcControl,
    /// Directory and settings menu.
    Admin,
    /// Waiting for the username of a user to add.
    AwaitingAddUsername,
    /// Waiting for the role of the user being added.
    AwaitingAddRole,
    /// Waiting for the username of a user to remove.
    AwaitingRemoveUsername,
    /// Waiting for the username whose role should change.
    AwaitingChangeRoleUsername,
    /// Waiting for the new role.
    AwaitingNewRole,
    /// Waiting for the new MAC address.
    AwaitingNewMac,
}

impl StateTag {
    /// Every tag, in menu order.
    pub const ALL: [Self; 9] = [
        Self::Main,
        Self::PcControl,
        Self::Admin,
        Self::AwaitingAddUsername,
        Self::AwaitingAddRole,
        Self::AwaitingRemoveUsername,
        Self::AwaitingChangeRoleUsername,
        Self::AwaitingNewRole,
        Self::AwaitingNewMac,
    ];

    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::PcControl => "PC_CONTROL",
            Self::Admin => "ADMIN",
            Self::AwaitingAddUsername => "AWAITING_ADD_USERNAME",
            Self::AwaitingAddRole => "AWAITING_ADD_ROLE",
            Self::AwaitingRemoveUsername => "AWAITING_REMOVE_USERNAME",
            Self::AwaitingChangeRoleUsername => "AWAITING_CHANGE_ROLE_USERNAME",
            Self::AwaitingNewRole => "AWAITING_NEW_ROLE",
            Self::AwaitingNewMac => "AWAITING_NEW_MAC",
        }
    }

    /// Returns true if only admins may be in this state.
    #[must_use]
    pub const fn requires_admin(self) -> bool {
        !matches!(self, Self::Main)
    }

    /// Returns true if the state reads free-form text instead of menu labels.
    #[must_use]
    pub const fn is_awaiting(self) -> bool {
        !matches!(self, Self::Main | Self::PcControl | Self::Admin)
    }

    /// The menu a state falls back to when its step fails.
    #[must_use]
    pub const fn owning_menu(self) -> Self {
        match self {
            Self::Main => Self::Main,
            Self::PcControl => Self::PcControl,
            Self::Admin
            | Self::AwaitingAddUsername
            | Self::AwaitingAddRole
            | Self::AwaitingRemoveUsername
            | Self::AwaitingChangeRoleUsername
            | Self::AwaitingNewRole
            | Self::AwaitingNewMac => Self::Admin,
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Steps of the add-user flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddUserFlow {
    /// Nothing collected yet.
    AwaitingUsername,
    /// Username collected, role pending.
    AwaitingRole {
        /// The user being added.
        username: Username,
    },
}

/// Steps of the change-role flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRoleFlow {
    /// Nothing collected yet.
    AwaitingUsername,
    /// Username collected, new role pending.
    AwaitingRole {
        /// The user whose role changes.
        username: Username,
    },
}

/// The state of one chat, including the fields its current flow collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatState {
    /// Top-level menu.
    #[default]
    Main,
    /// Host power menu.
    PcControl,
    /// Directory and settings menu.
    Admin,
    /// Adding a user.
    AddUser(AddUserFlow),
    /// Waiting for the username to remove.
    RemoveUser,
    /// Changing a user's role.
    ChangeRole(ChangeRoleFlow),
    /// Waiting for the new MAC address.
    ChangeMac,
}

impl ChatState {
    /// The flat tag of this state.
    #[must_use]
    pub const fn tag(&self) -> StateTag {
        match self {
            Self::Main => StateTag::Main,
            Self::PcControl => StateTag::PcControl,
            Self::Admin => StateTag::Admin,
            Self::AddUser(AddUserFlow::AwaitingUsername) => StateTag::AwaitingAddUsername,
            Self::AddUser(AddUserFlow::AwaitingRole { .. }) => StateTag::AwaitingAddRole,
            Self::RemoveUser => StateTag::AwaitingRemoveUsername,
            Self::ChangeRole(ChangeRoleFlow::AwaitingUsername) => {
                StateTag::AwaitingChangeRoleUsername
            }
            Self::ChangeRole(ChangeRoleFlow::AwaitingRole { .. }) => StateTag::AwaitingNewRole,
            Self::ChangeMac => StateTag::AwaitingNewMac,
        }
    }

    /// Returns true if only admins may be in this state.
    #[must_use]
    pub const fn requires_admin(&self) -> bool {
        self.tag().requires_admin()
    }

    /// The fieldless state for a menu tag, if `tag` is a menu.
    #[must_use]
    pub const fn menu(tag: StateTag) -> Option<Self> {
        match tag {
            StateTag::Main => Some(Self::Main),
            StateTag::PcControl => Some(Self::PcControl),
            StateTag::Admin => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Check if a transition is allowed by the state machine.
#[must_use]
pub const fn is_valid_transition(from: StateTag, to: StateTag) -> bool {
    use StateTag::{
        Admin, AwaitingAddRole, AwaitingAddUsername, AwaitingChangeRoleUsername,
        AwaitingNewMac, AwaitingNewRole, AwaitingRemoveUsername, Main, PcControl,
    };

    matches!(
        (from, to),
        // Resets (/start, Back, lapsed access, demotion) land in Main from anywhere
        (_, Main)
            | (Main | PcControl, PcControl)
            | (Main, Admin)
            | (
                Admin,
                Admin
                    | AwaitingAddUsername
                    | AwaitingRemoveUsername
                    | AwaitingChangeRoleUsername
                    | AwaitingNewMac
            )
            | (AwaitingAddUsername, AwaitingAddRole)
            | (AwaitingChangeRoleUsername, AwaitingNewRole)
            // Every flow step ends (or fails) back in Admin
            | (
                AwaitingAddUsername
                    | AwaitingAddRole
                    | AwaitingRemoveUsername
                    | AwaitingChangeRoleUsername
                    | AwaitingNewRole
                    | AwaitingNewMac,
                Admin
            )
    )
}

/// Validates a transition and returns the target tag if valid.
///
/// # Errors
///
/// Returns `ControlError::Internal` if the transition is not allowed.
pub fn validate_transition(chat_id: ChatId, from: StateTag, to: StateTag) -> Result<StateTag> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ControlError::Internal(format!(
            "invalid transition for chat {chat_id}: {from} -> {to}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Username {
        Username::parse("alice").unwrap()
    }

    #[test]
    fn tags_follow_flow_fields() {
        assert_eq!(ChatState::default().tag(), StateTag::Main);
        assert_eq!(
            ChatState::AddUser(AddUserFlow::AwaitingUsername).tag(),
            StateTag::AwaitingAddUsername
        );
        assert_eq!(
            ChatState::AddUser(AddUserFlow::AwaitingRole { username: alice() }).tag(),
            StateTag::AwaitingAddRole
        );
        assert_eq!(
            ChatState::ChangeRole(ChangeRoleFlow::AwaitingRole { username: alice() }).tag(),
            StateTag::AwaitingNewRole
        );
        assert_eq!(ChatState::ChangeMac.tag(), StateTag::AwaitingNewMac);
    }

    #[test]
    fn only_main_is_open_to_users() {
        for tag in StateTag::ALL {
            assert_eq!(tag.requires_admin(), tag != StateTag::Main, "{tag}");
        }
    }

    #[test]
    fn awaiting_states_fall_back_to_admin() {
        for tag in StateTag::ALL.into_iter().filter(|t| t.is_awaiting()) {
            assert_eq!(tag.owning_menu(), StateTag::Admin);
            assert!(is_valid_transition(tag, tag.owning_menu()));
        }
        assert_eq!(StateTag::PcControl.owning_menu(), StateTag::PcControl);
    }

    #[test]
    fn valid_transitions() {
        use StateTag::*;

        assert!(is_valid_transition(Main, PcControl));
        assert!(is_valid_transition(Main, Admin));
        assert!(is_valid_transition(PcControl, Main));
        assert!(is_valid_transition(Admin, AwaitingAddUsername));
        assert!(is_valid_transition(AwaitingAddUsername, AwaitingAddRole));
        assert!(is_valid_transition(AwaitingAddRole, Admin));
        assert!(is_valid_transition(AwaitingChangeRoleUsername, AwaitingNewRole));
        for tag in StateTag::ALL {
            assert!(is_valid_transition(tag, Main));
        }
    }

    #[test]
    fn invalid_transitions() {
        use StateTag::*;

        // Flows can only be entered from the admin menu
        assert!(!is_valid_transition(Main, AwaitingAddUsername));
        assert!(!is_valid_transition(PcControl, Admin));
        // Role steps need their username step first
        assert!(!is_valid_transition(Admin, AwaitingAddRole));
        assert!(!is_valid_transition(Admin, AwaitingNewRole));
        assert!(!is_valid_transition(AwaitingAddUsername, AwaitingNewRole));
    }

    #[test]
    fn validate_transition_err() {
        let result = validate_transition(ChatId::new(7), StateTag::Main, StateTag::AwaitingNewMac);
        match result {
            Err(ControlError::Internal(msg)) => {
                assert!(msg.contains("MAIN -> AWAITING_NEW_MAC"));
            }
            other => panic!("expected Internal error, got {other:?}"),
        }
    }
}
