//! In-memory doubles for the host traits.
//!
//! Each double records how often it was called so tests can assert that a
//! side effect happened exactly once, or not at all.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use hostwake_core::MacAddress;
use parking_lot::Mutex;

use crate::error::{HostError, Result};
use crate::local::LocalInfo;
use crate::power::{PowerController, PowerSignal};
use crate::probe::HostProber;
use crate::ssh::{RemoteQuery, RemoteSession};
use crate::target::HostTarget;

/// A prober with a settable answer.
#[derive(Debug, Default)]
pub struct MockProber {
    reachable: AtomicBool,
    calls: AtomicUsize,
}

impl MockProber {
    /// Create a prober that answers `reachable`.
    #[must_use]
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
            calls: AtomicUsize::new(0),
        }
    }

    /// Change the answer.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of probes so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostProber for MockProber {
    async fn probe(&self, target: &HostTarget) -> Result<bool> {
        target.require_ip()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reachable.load(Ordering::SeqCst))
    }
}

/// A power controller that records the signals it was asked to send.
#[derive(Debug, Default)]
pub struct MockPower {
    wakes: Mutex<Vec<MacAddress>>,
    shutdowns: AtomicUsize,
}

impl MockPower {
    /// Create a new mock power controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wake signals sent.
    #[must_use]
    pub fn wake_count(&self) -> usize {
        self.wakes.lock().len()
    }

    /// The MAC the most recent wake signal was sent to.
    #[must_use]
    pub fn last_wake_mac(&self) -> Option<MacAddress> {
        self.wakes.lock().last().copied()
    }

    /// Number of shutdown signals sent.
    #[must_use]
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PowerController for MockPower {
    async fn wake(&self, target: &HostTarget) -> Result<PowerSignal> {
        let mac = target.require_mac()?;
        self.wakes.lock().push(mac);
        Ok(PowerSignal::WakeSent)
    }

    async fn shutdown(&self, target: &HostTarget) -> Result<PowerSignal> {
        target.require_ip()?;
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(PowerSignal::ShutdownSent)
    }
}

/// A remote session with a canned outcome.
#[derive(Debug)]
pub struct MockRemote {
    outcome: Mutex<Result<String>>,
    calls: AtomicUsize,
}

impl MockRemote {
    /// Create a session whose queries succeed with `output`.
    #[must_use]
    pub fn succeeding(output: impl Into<String>) -> Self {
        Self {
            outcome: Mutex::new(Ok(output.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a session whose queries fail with `error`.
    #[must_use]
    pub fn failing(error: HostError) -> Self {
        Self {
            outcome: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of queries run so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSession for MockRemote {
    async fn run_query(&self, target: &HostTarget, _query: RemoteQuery) -> Result<String> {
        target.require_ip()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().clone()
    }
}

/// Local info with fixed answers.
#[derive(Debug, Clone)]
pub struct MockLocal {
    /// Returned by `addresses`.
    pub addresses: String,
    /// Returned by `uptime`.
    pub uptime: String,
}

impl Default for MockLocal {
    fn default() -> Self {
        Self {
            addresses: "192.168.1.2".to_string(),
            uptime: "up 3 days".to_string(),
        }
    }
}

#[async_trait]
impl LocalInfo for MockLocal {
    async fn addresses(&self) -> Result<String> {
        Ok(self.addresses.clone())
    }

    async fn uptime(&self) -> Result<String> {
        Ok(self.uptime.clone())
    }
}
