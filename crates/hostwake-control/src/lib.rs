//! Conversation engine for hostwake.
//!
//! This crate provides the business logic behind the chat front end: it maps
//! each chat to a state, checks the caller's role before anything privileged
//! happens, interprets text against what the current state expects and drives
//! the host collaborators.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Chat transport (Telegram)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ InboundEvent / OutboundReply
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ConversationEngine                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Access     │ │  Session    │ │    Chat State       │    │
//! │  │  Control    │ │  Table      │ │    Machine          │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────────┐
//!        │  Store   │   │ Registry │   │ Host (ping,  │
//!        │ (RocksDB)│   │ (target) │   │  WoL, ssh)   │
//!        └──────────┘   └──────────┘   └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use hostwake_control::{
//!     Conversation, ConversationEngine, HostRegistry, HostServices, InboundEvent,
//! };
//! use hostwake_core::ChatId;
//! use hostwake_host::{
//!     HostTarget, LanPowerController, PingProber, ShellLocalInfo, SshSessionClient,
//! };
//! use hostwake_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/hostwake")?);
//! let registry = HostRegistry::load(Arc::clone(&store), HostTarget::default())?;
//!
//! let ssh = Arc::new(SshSessionClient::default());
//! let host = HostServices {
//!     prober: Arc::new(PingProber::default()),
//!     power: Arc::new(LanPowerController::new(Default::default(), Arc::clone(&ssh))),
//!     remote: ssh,
//!     local: Arc::new(ShellLocalInfo::default()),
//! };
//!
//! let engine = ConversationEngine::with_defaults(store, registry, host);
//! let replies = engine
//!     .handle(InboundEvent::new("alice", ChatId::new(1), "/start"))
//!     .await;
//! for reply in replies {
//!     println!("{}", reply.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # State Machine
//!
//! - `Main` → `PcControl` (admin, host configured) or `Admin` (admin)
//! - `PcControl` → `Main` (Back)
//! - `Admin` → one of the flows, or `Main` (Back)
//! - every flow → `Admin` when it completes or fails
//! - any state → `Main` on `/start`, after regained access, or after demotion
//!
//! See the [`state`] module for transition validation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod menu;
pub mod registry;
pub mod service;
pub mod session;
pub mod state;
pub mod types;

pub use error::{ControlError, Result};
pub use menu::{Label, Menu};
pub use registry::HostRegistry;
pub use service::{Conversation, ConversationEngine, HostServices};
pub use session::{ChatSession, SessionTable};
pub use state::{AddUserFlow, ChangeRoleFlow, ChatState, StateTag};
pub use types::{ControlConfig, InboundEvent, OutboundReply};
