//! Conversation engine implementation.
//!
//! This module provides the `Conversation` trait and the
//! `ConversationEngine` implementation that turns inbound chat events into
//! replies, state transitions and host operations.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hostwake_core::{ChatId, MacAddress, Role, Username};
use hostwake_host::{
    HostError, HostProber, HostTarget, LocalInfo, PowerController, RemoteQuery, RemoteSession,
};
use hostwake_store::{Store, UserRecord};

use crate::error::{ControlError, Result};
use crate::menu::{Label, Menu};
use crate::registry::HostRegistry;
use crate::session::{ChatSession, SessionTable};
use crate::state::{self, AddUserFlow, ChangeRoleFlow, ChatState, StateTag};
use crate::types::{ControlConfig, InboundEvent, OutboundReply};

/// Trait defining the conversational front end.
///
/// Implementations never fail: every error becomes a reply.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Handle one inbound event and return the replies to send, in order.
    ///
    /// An empty list means the event was a no-op.
    async fn handle(&self, event: InboundEvent) -> Vec<OutboundReply>;
}

/// The host collaborators the engine drives.
#[derive(Clone)]
pub struct HostServices {
    /// Reachability probing.
    pub prober: Arc<dyn HostProber>,
    /// Wake and shutdown triggers.
    pub power: Arc<dyn PowerController>,
    /// Remote uptime queries.
    pub remote: Arc<dyn RemoteSession>,
    /// Queries about the bot's own machine.
    pub local: Arc<dyn LocalInfo>,
}

/// A caller resolved against the directory.
struct Caller {
    username: Username,
    role: Role,
}

impl Caller {
    fn require_admin(&self) -> Result<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ControlError::RoleCheckFailed {
                required: Role::Admin,
                actual: self.role,
            })
        }
    }
}

/// Replies collected while handling one event.
struct Replies {
    chat_id: ChatId,
    items: Vec<OutboundReply>,
}

impl Replies {
    const fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            items: Vec::new(),
        }
    }

    fn say(&mut self, text: impl Into<String>) {
        self.items.push(OutboundReply::text(self.chat_id, text));
    }

    fn say_with(&mut self, text: impl Into<String>, menu: Menu) {
        self.items
            .push(OutboundReply::with_menu(self.chat_id, text, menu));
    }
}

/// The main conversation engine implementation.
pub struct ConversationEngine<S: Store> {
    store: Arc<S>,
    registry: HostRegistry<S>,
    host: HostServices,
    sessions: SessionTable,
    config: ControlConfig,
}

impl<S: Store> ConversationEngine<S> {
    /// Create a new engine.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        registry: HostRegistry<S>,
        host: HostServices,
        config: ControlConfig,
    ) -> Self {
        Self {
            store,
            registry,
            host,
            sessions: SessionTable::new(),
            config,
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>, registry: HostRegistry<S>, host: HostServices) -> Self {
        Self::new(store, registry, host, ControlConfig::default())
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the host registry.
    #[must_use]
    pub const fn registry(&self) -> &HostRegistry<S> {
        &self.registry
    }

    /// Get the session table.
    #[must_use]
    pub const fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// The current state of a chat, `None` if it was never seen.
    pub async fn state_of(&self, chat_id: ChatId) -> Option<StateTag> {
        self.sessions.state_of(chat_id).await.map(|s| s.tag())
    }

    /// Resolve the caller's role from the directory.
    fn authorize(&self, caller: Option<&str>) -> Result<Caller> {
        let raw = caller.ok_or_else(|| ControlError::AccessDenied("<no username>".to_string()))?;
        let username =
            Username::parse(raw).map_err(|_| ControlError::AccessDenied(raw.to_string()))?;

        match self.store.get_user(&username)? {
            Some(record) => Ok(Caller {
                username,
                role: record.role,
            }),
            None => Err(ControlError::AccessDenied(username.to_string())),
        }
    }

    /// Perform a validated state transition.
    fn transition(session: &mut ChatSession, next: ChatState) -> Result<()> {
        let from = session.state.tag();
        let to = state::validate_transition(session.chat_id, from, next.tag())?;

        if from != to {
            tracing::info!(chat_id = %session.chat_id, from = %from, to = %to, "Chat state changed");
        }

        session.state = next;
        Ok(())
    }

    /// Move to a menu state and show that menu.
    fn enter_menu(
        session: &mut ChatSession,
        tag: StateTag,
        role: Role,
        replies: &mut Replies,
    ) -> Result<()> {
        let next = ChatState::menu(tag)
            .ok_or_else(|| ControlError::Internal(format!("{tag} is not a menu")))?;
        Self::transition(session, next)?;

        let (title, menu) = match tag {
            StateTag::PcControl => ("💻 PC control:", Menu::pc_control()),
            StateTag::Admin => ("⚙️ Admin panel:", Menu::admin()),
            _ => ("Main menu:", Menu::main(role)),
        };
        replies.say_with(title, menu);
        Ok(())
    }

    /// Put the chat back in `Main` regardless of where it was.
    fn reset(session: &mut ChatSession, role: Role, text: &str, replies: &mut Replies) {
        let from = session.state.tag();
        if from != StateTag::Main {
            tracing::info!(chat_id = %session.chat_id, from = %from, to = %StateTag::Main, "Chat state reset");
        }
        session.state = ChatState::Main;
        replies.say_with(text, Menu::main(role));
    }

    /// Reply with the error and fall back to the state's owning menu.
    fn recover(caller: &Caller, session: &mut ChatSession, err: &ControlError, replies: &mut Replies) {
        let tag = session.state.tag();

        match err {
            ControlError::InvalidInput(_) | ControlError::NotConfigured(_) => {
                tracing::debug!(chat_id = %session.chat_id, state = %tag, error = %err, "Rejected input");
            }
            ControlError::RoleCheckFailed { .. } => {
                tracing::warn!(
                    chat_id = %session.chat_id,
                    caller = %caller.username,
                    error = %err,
                    "Role check failed"
                );
            }
            _ => {
                tracing::error!(
                    chat_id = %session.chat_id,
                    state = %tag,
                    retriable = err.is_retriable(),
                    error = %err,
                    "Event handling failed"
                );
            }
        }

        replies.say(err.user_message());

        let owning = tag.owning_menu();
        if owning != tag {
            if let Err(e) = Self::enter_menu(session, owning, caller.role, replies) {
                tracing::error!(chat_id = %session.chat_id, error = %e, "Could not return to menu");
                Self::reset(session, caller.role, "Main menu:", replies);
            }
        }
    }

    /// Run a host call under the engine's outer bound.
    async fn bounded<T, F>(&self, call: F) -> std::result::Result<T, HostError>
    where
        F: Future<Output = std::result::Result<T, HostError>>,
    {
        tokio::time::timeout(self.config.operation_timeout(), call)
            .await
            .unwrap_or(Err(HostError::Timeout))
    }

    /// Probe the host; a timeout counts as unreachable.
    async fn probe(&self, target: &HostTarget) -> Result<bool> {
        match self.bounded(self.host.prober.probe(target)).await {
            Ok(reachable) => Ok(reachable),
            Err(HostError::Timeout) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn dispatch(
        &self,
        caller: &Caller,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        match session.state.clone() {
            ChatState::Main => self.on_main(caller, text, session, replies).await,
            ChatState::PcControl => self.on_pc_control(caller, text, session, replies).await,
            ChatState::Admin => self.on_admin(caller, text, session, replies),
            ChatState::AddUser(AddUserFlow::AwaitingUsername) => {
                Self::on_add_username(text, session, replies)
            }
            ChatState::AddUser(AddUserFlow::AwaitingRole { username }) => {
                self.on_add_role(caller, &username, text, session, replies)
            }
            ChatState::RemoveUser => self.on_remove_user(caller, text, session, replies),
            ChatState::ChangeRole(ChangeRoleFlow::AwaitingUsername) => {
                Self::on_change_role_username(text, session, replies)
            }
            ChatState::ChangeRole(ChangeRoleFlow::AwaitingRole { username }) => {
                self.on_new_role(caller, &username, text, session, replies)
            }
            ChatState::ChangeMac => self.on_new_mac(caller, text, session, replies),
        }
    }

    // =========================================================================
    // Menus
    // =========================================================================

    async fn on_main(
        &self,
        caller: &Caller,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        match Label::parse(text) {
            Some(Label::PcControl) => {
                caller.require_admin()?;
                let target = self.registry.current();
                if target.mac.is_none() {
                    return Err(ControlError::NotConfigured("mac".to_string()));
                }
                if !target.is_configured() {
                    return Err(ControlError::NotConfigured("ip".to_string()));
                }
                Self::enter_menu(session, StateTag::PcControl, caller.role, replies)
            }
            Some(Label::AdminPanel) => {
                caller.require_admin()?;
                Self::enter_menu(session, StateTag::Admin, caller.role, replies)
            }
            Some(Label::IpAddress) => {
                let addresses = self.bounded(self.host.local.addresses()).await?;
                replies.say(format!("🌐 IP: {addresses}"));
                Ok(())
            }
            Some(Label::Uptime) => {
                let uptime = self.bounded(self.host.local.uptime()).await?;
                replies.say(format!("🕒 {uptime}"));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn on_pc_control(
        &self,
        caller: &Caller,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        let label = match Label::parse(text) {
            Some(Label::Back) => {
                return Self::enter_menu(session, StateTag::Main, caller.role, replies);
            }
            Some(label @ (Label::TurnOn | Label::TurnOff | Label::Uptime)) => label,
            _ => return Ok(()),
        };

        let target = self.registry.current();
        let reachable = self.probe(&target).await?;

        match (label, reachable) {
            (Label::TurnOn, true) => replies.say("💡 The PC is already on."),
            (Label::TurnOn, false) => {
                self.bounded(self.host.power.wake(&target)).await?;
                tracing::info!(chat_id = %session.chat_id, caller = %caller.username, "Wake signal sent");
                replies.say("⚡ Wake signal sent.");
            }
            (Label::TurnOff, false) => replies.say("💤 The PC is already off."),
            (Label::TurnOff, true) => {
                self.bounded(self.host.power.shutdown(&target)).await?;
                tracing::info!(chat_id = %session.chat_id, caller = %caller.username, "Shutdown signal sent");
                replies.say("⏻ Shutdown signal sent.");
            }
            (_, false) => return Err(HostError::Unreachable.into()),
            (_, true) => {
                let output = self
                    .bounded(self.host.remote.run_query(&target, RemoteQuery::Uptime))
                    .await
                    .map_err(ControlError::UptimeUnavailable)?;
                if output.is_empty() {
                    replies.say("🕒 (no output)");
                } else {
                    replies.say(format!("🕒 {output}"));
                }
            }
        }

        Ok(())
    }

    fn on_admin(
        &self,
        caller: &Caller,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        match Label::parse(text) {
            Some(Label::AddUser) => {
                Self::transition(session, ChatState::AddUser(AddUserFlow::AwaitingUsername))?;
                replies.say("Enter the username of the new user:");
            }
            Some(Label::RemoveUser) => {
                Self::transition(session, ChatState::RemoveUser)?;
                replies.say("Enter the username to remove:");
            }
            Some(Label::ChangeRole) => {
                Self::transition(session, ChatState::ChangeRole(ChangeRoleFlow::AwaitingUsername))?;
                replies.say("Enter the username whose role should change:");
            }
            Some(Label::ChangeMac) => {
                let current = self
                    .registry
                    .current()
                    .mac
                    .map_or_else(|| "not set".to_string(), |mac| mac.to_string());
                Self::transition(session, ChatState::ChangeMac)?;
                replies.say(format!(
                    "Current MAC: {current}\nEnter the new MAC address (AA:BB:CC:DD:EE:FF):"
                ));
            }
            Some(Label::List) => {
                let users = self.store.list_users()?;
                replies.say(render_user_list(&users));
            }
            Some(Label::Back) => {
                Self::enter_menu(session, StateTag::Main, caller.role, replies)?;
            }
            _ => {}
        }
        Ok(())
    }

    // =========================================================================
    // Flows
    // =========================================================================

    fn on_add_username(text: &str, session: &mut ChatSession, replies: &mut Replies) -> Result<()> {
        let username = Username::parse(text)?;
        replies.say(format!("Enter the role for {username} (user/admin):"));
        Self::transition(session, ChatState::AddUser(AddUserFlow::AwaitingRole { username }))
    }

    fn on_add_role(
        &self,
        caller: &Caller,
        username: &Username,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        let role: Role = text.parse()?;
        self.store.put_user(username, role)?;

        tracing::info!(
            username = %username,
            role = %role,
            by = %caller.username,
            "Added user"
        );

        replies.say(format!("✅ Added {username} with role {role}."));
        Self::enter_menu(session, StateTag::Admin, caller.role, replies)
    }

    fn on_remove_user(
        &self,
        caller: &Caller,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        let username = Username::parse(text)?;
        let removed = self.store.delete_user(&username)?;

        if removed {
            tracing::info!(username = %username, by = %caller.username, "Removed user");
            replies.say(format!("✅ Removed {username}."));
        } else {
            replies.say(format!("ℹ️ {username} was not in the list."));
        }
        Self::enter_menu(session, StateTag::Admin, caller.role, replies)
    }

    fn on_change_role_username(
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        let username = Username::parse(text)?;
        replies.say(format!("Enter the new role for {username} (user/admin):"));
        Self::transition(
            session,
            ChatState::ChangeRole(ChangeRoleFlow::AwaitingRole { username }),
        )
    }

    fn on_new_role(
        &self,
        caller: &Caller,
        username: &Username,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        let role: Role = text.parse()?;
        if self.store.get_user(username)?.is_none() {
            return Err(ControlError::InvalidInput(format!(
                "{username} is not in the list."
            )));
        }
        self.store.put_user(username, role)?;

        tracing::info!(
            username = %username,
            role = %role,
            by = %caller.username,
            "Changed role"
        );

        replies.say(format!("✅ {username} is now {role}."));
        Self::enter_menu(session, StateTag::Admin, caller.role, replies)
    }

    fn on_new_mac(
        &self,
        caller: &Caller,
        text: &str,
        session: &mut ChatSession,
        replies: &mut Replies,
    ) -> Result<()> {
        let mac: MacAddress = text.parse()?;
        self.registry.set_mac(mac)?;

        tracing::info!(mac = %mac, by = %caller.username, "Changed host MAC");

        replies.say(format!("✅ MAC address set to {mac}."));
        Self::enter_menu(session, StateTag::Admin, caller.role, replies)
    }
}

#[async_trait]
impl<S: Store + 'static> Conversation for ConversationEngine<S> {
    async fn handle(&self, event: InboundEvent) -> Vec<OutboundReply> {
        let slot = self.sessions.slot(event.chat_id);
        let mut session = slot.lock().await;
        session.last_event_at = Some(Utc::now());

        let mut replies = Replies::new(event.chat_id);
        let text = event.text.trim();

        let caller = match self.authorize(event.caller.as_deref()) {
            Ok(caller) => caller,
            Err(e @ ControlError::AccessDenied(_)) => {
                tracing::warn!(chat_id = %event.chat_id, error = %e, "Access denied");
                if let Some(name) = event.caller.as_deref().and_then(|c| Username::parse(c).ok()) {
                    session.mark_lapsed(name);
                }
                replies.say(e.user_message());
                return replies.items;
            }
            Err(e) => {
                tracing::error!(chat_id = %event.chat_id, error = %e, "Role lookup failed");
                replies.say(e.user_message());
                return replies.items;
            }
        };

        if is_start_command(text) {
            session.clear_lapsed(&caller.username);
            Self::reset(&mut session, caller.role, &self.config.greeting, &mut replies);
            return replies.items;
        }

        if session.clear_lapsed(&caller.username) {
            tracing::info!(chat_id = %event.chat_id, caller = %caller.username, "Access restored");
            Self::reset(&mut session, caller.role, "Main menu:", &mut replies);
        }

        if session.state.requires_admin() && !caller.role.is_admin() {
            let err = ControlError::RoleCheckFailed {
                required: Role::Admin,
                actual: caller.role,
            };
            tracing::warn!(
                chat_id = %event.chat_id,
                caller = %caller.username,
                state = %session.state.tag(),
                "Role revoked mid-flow"
            );
            replies.say(err.user_message());
            Self::reset(&mut session, caller.role, "Main menu:", &mut replies);
            return replies.items;
        }

        if let Err(e) = self.dispatch(&caller, text, &mut session, &mut replies).await {
            Self::recover(&caller, &mut session, &e, &mut replies);
        }

        replies.items
    }
}

/// Returns true for `/start`, with or without a bot suffix or payload.
fn is_start_command(text: &str) -> bool {
    text == "/start" || text.starts_with("/start ") || text.starts_with("/start@")
}

/// Render the directory listing.
fn render_user_list(users: &[UserRecord]) -> String {
    if users.is_empty() {
        return "The list is empty.".to_string();
    }
    users
        .iter()
        .map(|u| format!("👤 {} (role: {})", u.username, u.role))
        .collect::<Vec<_>>()
        .join("\n")
}
