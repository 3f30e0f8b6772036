//! Chat session table.
//!
//! Sessions live in process memory only. A session is created lazily on the
//! first event for a chat and never removed; a restart puts every chat back
//! in `Main`.
//!
//! Each session sits behind its own async mutex. The engine holds that mutex
//! for the whole of an event, which serializes events for one chat in arrival
//! order while events for different chats run concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hostwake_core::{ChatId, Username};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::state::ChatState;

/// Conversation state of one chat.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// The chat this session belongs to.
    pub chat_id: ChatId,
    /// Current state, including flow fields.
    pub state: ChatState,
    /// Callers denied in this chat since they last had access.
    pub lapsed: HashSet<Username>,
    /// When the last event for this chat was handled.
    pub last_event_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    /// Create a session in the initial state.
    #[must_use]
    pub fn new(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            state: ChatState::Main,
            lapsed: HashSet::new(),
            last_event_at: None,
        }
    }

    /// Remember that `username` was denied in this chat.
    pub fn mark_lapsed(&mut self, username: Username) {
        self.lapsed.insert(username);
    }

    /// Forget a denial for `username`, returning whether there was one.
    pub fn clear_lapsed(&mut self, username: &Username) -> bool {
        self.lapsed.remove(username)
    }
}

/// A shared handle to one chat's session.
pub type SessionSlot = Arc<AsyncMutex<ChatSession>>;

/// Concurrency-safe map of chat sessions.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<ChatId, SessionSlot>>,
}

impl SessionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session slot for a chat, creating it on first use.
    ///
    /// The table lock is released before the slot is returned, so waiting on
    /// one chat's slot never blocks lookups for other chats.
    #[must_use]
    pub fn slot(&self, chat_id: ChatId) -> SessionSlot {
        let mut sessions = self.sessions.lock();
        Arc::clone(
            sessions
                .entry(chat_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(ChatSession::new(chat_id)))),
        )
    }

    /// Snapshot of a chat's current state, `None` if the chat was never seen.
    ///
    /// Waits for any event in progress for that chat to finish.
    pub async fn state_of(&self, chat_id: ChatId) -> Option<ChatState> {
        let slot = self.sessions.lock().get(&chat_id).cloned()?;
        let session = slot.lock().await;
        Some(session.state.clone())
    }

    /// Number of chats seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Check if no chat has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slot_is_created_lazily() {
        let table = SessionTable::new();
        assert!(table.is_empty());
        assert_eq!(table.state_of(ChatId::new(1)).await, None);

        let slot = table.slot(ChatId::new(1));
        assert_eq!(slot.lock().await.state, ChatState::Main);
        assert_eq!(table.len(), 1);
        assert_eq!(table.state_of(ChatId::new(1)).await, Some(ChatState::Main));
    }

    #[tokio::test]
    async fn same_chat_shares_slot() {
        let table = SessionTable::new();
        let a = table.slot(ChatId::new(5));
        let b = table.slot(ChatId::new(5));
        assert!(Arc::ptr_eq(&a, &b));

        a.lock().await.state = ChatState::Admin;
        assert_eq!(table.state_of(ChatId::new(5)).await, Some(ChatState::Admin));
    }

    #[tokio::test]
    async fn chats_are_isolated() {
        let table = SessionTable::new();
        table.slot(ChatId::new(1)).lock().await.state = ChatState::PcControl;

        let other = table.slot(ChatId::new(2));
        assert_eq!(other.lock().await.state, ChatState::Main);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lapsed_is_tracked_per_caller() {
        let mut session = ChatSession::new(ChatId::new(1));
        let stranger = Username::parse("stranger").unwrap();
        let admin = Username::parse("root").unwrap();

        session.mark_lapsed(stranger.clone());
        assert!(!session.clear_lapsed(&admin));
        assert!(session.clear_lapsed(&stranger));
        assert!(!session.clear_lapsed(&stranger));
    }

    #[tokio::test]
    async fn busy_chat_does_not_block_others() {
        let table = SessionTable::new();
        let busy = table.slot(ChatId::new(1));
        let _held = busy.lock().await;

        let other = table.slot(ChatId::new(2));
        assert!(other.try_lock().is_ok());
    }
}
