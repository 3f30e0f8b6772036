//! Remote host control for hostwake.
//!
//! This crate talks to the one machine the bot controls. Every operation is
//! bounded by a timeout, and a timeout is reported as an ordinary outcome
//! rather than a crash.
//!
//! - [`HostProber`]: is the host up? (`ping`)
//! - [`PowerController`]: fire-and-forget wake (Wake-on-LAN) and shutdown
//! - [`RemoteSession`]: one-shot authenticated command execution (`ssh`)
//! - [`LocalInfo`]: facts about the machine the bot itself runs on
//!
//! The traits exist so the conversation engine can be exercised against
//! in-memory doubles; the concrete types shell out to system tools.
//!
//! # Testing
//!
//! Enable the `test-utils` feature for [`mock`], which provides recording
//! doubles for every trait:
//!
//! ```ignore
//! use hostwake_host::mock::{MockPower, MockProber};
//!
//! let prober = MockProber::new(false);
//! let power = MockPower::new();
//! assert_eq!(power.wake_count(), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod local;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod power;
pub mod probe;
mod process;
pub mod ssh;
pub mod target;

pub use config::{ProbeConfig, SshConfig, WakeConfig};
pub use error::{HostError, Result};
pub use local::{LocalInfo, ShellLocalInfo};
pub use power::{magic_packet, LanPowerController, PowerController, PowerSignal};
pub use probe::{HostProber, PingProber};
pub use ssh::{RemoteQuery, RemoteSession, SshSessionClient};
pub use target::HostTarget;
