//! Power signals: Wake-on-LAN and remote shutdown.
//!
//! Both operations are one-way. A successful call means the signal left this
//! machine, not that the host changed state; callers re-probe to find out.

use std::sync::Arc;

use async_trait::async_trait;
use hostwake_core::MacAddress;
use tokio::net::UdpSocket;

use crate::config::WakeConfig;
use crate::error::Result;
use crate::ssh::{RemoteQuery, RemoteSession};
use crate::target::HostTarget;

/// Outcome of a power operation: the signal was sent, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSignal {
    /// A wake packet was broadcast.
    WakeSent,
    /// A shutdown request was dispatched.
    ShutdownSent,
}

/// Issues wake and shutdown triggers to the host.
#[async_trait]
pub trait PowerController: Send + Sync {
    /// Send a wake trigger.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NotConfigured` if the target has no MAC, or
    /// `HostError::Io` if the packet could not be sent.
    async fn wake(&self, target: &HostTarget) -> Result<PowerSignal>;

    /// Send a shutdown trigger.
    ///
    /// # Errors
    ///
    /// Returns `HostError::NotConfigured` if the target cannot be addressed.
    async fn shutdown(&self, target: &HostTarget) -> Result<PowerSignal>;
}

/// Build a Wake-on-LAN magic packet: six `0xFF` bytes followed by the MAC
/// repeated sixteen times.
#[must_use]
pub fn magic_packet(mac: &MacAddress) -> [u8; 102] {
    let mut packet = [0xFFu8; 102];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(mac.as_bytes());
    }
    packet
}

/// Power controller for a host on the local network.
///
/// Wakes by UDP broadcast and shuts down by running the OS shutdown command
/// over a remote session in a background task.
pub struct LanPowerController<R: RemoteSession + 'static> {
    config: WakeConfig,
    session: Arc<R>,
}

impl<R: RemoteSession + 'static> LanPowerController<R> {
    /// Create a new power controller.
    #[must_use]
    pub fn new(config: WakeConfig, session: Arc<R>) -> Self {
        Self { config, session }
    }
}

#[async_trait]
impl<R: RemoteSession + 'static> PowerController for LanPowerController<R> {
    async fn wake(&self, target: &HostTarget) -> Result<PowerSignal> {
        let mac = target.require_mac()?;
        let packet = magic_packet(&mac);

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.set_broadcast(true)?;
        socket.send_to(&packet, &self.config.broadcast_addr).await?;

        tracing::info!(mac = %mac, broadcast = %self.config.broadcast_addr, "Sent wake packet");

        Ok(PowerSignal::WakeSent)
    }

    async fn shutdown(&self, target: &HostTarget) -> Result<PowerSignal> {
        let ip = target.require_ip()?.to_string();
        target.require_ssh_user()?;

        let session = Arc::clone(&self.session);
        let target = target.clone();
        let task_ip = ip.clone();
        tokio::spawn(async move {
            match session.run_query(&target, RemoteQuery::Shutdown).await {
                Ok(_) => tracing::info!(ip = %task_ip, "Shutdown command accepted"),
                // The host usually drops the connection while going down.
                Err(e) => tracing::debug!(ip = %task_ip, error = %e, "Shutdown session ended"),
            }
        });

        tracing::info!(ip = %ip, "Dispatched shutdown");

        Ok(PowerSignal::ShutdownSent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use hostwake_core::OsHint;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSession {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteSession for RecordingSession {
        async fn run_query(&self, _target: &HostTarget, query: RemoteQuery) -> Result<String> {
            assert_eq!(query, RemoteQuery::Shutdown);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    fn target() -> HostTarget {
        HostTarget {
            mac: Some("AA:BB:CC:DD:EE:FF".parse().unwrap()),
            ip: Some("127.0.0.1".to_string()),
            ssh_user: Some("owner".to_string()),
            ssh_secret: None,
            os_hint: OsHint::Other,
        }
    }

    #[test]
    fn magic_packet_layout() {
        let mac: MacAddress = "01:02:03:04:05:06".parse().unwrap();
        let packet = magic_packet(&mac);

        assert_eq!(&packet[..6], &[0xFF; 6]);
        for chunk in packet[6..].chunks(6) {
            assert_eq!(chunk, mac.as_bytes());
        }
    }

    #[tokio::test]
    async fn wake_sends_magic_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let controller = LanPowerController::new(
            WakeConfig {
                broadcast_addr: addr.to_string(),
            },
            Arc::new(RecordingSession::default()),
        );

        let signal = controller.wake(&target()).await.unwrap();
        assert_eq!(signal, PowerSignal::WakeSent);

        let mut buf = [0u8; 200];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(len, 102);
        assert_eq!(&buf[..len], &magic_packet(&target().mac.unwrap())[..]);
    }

    #[tokio::test]
    async fn wake_requires_mac() {
        let controller =
            LanPowerController::new(WakeConfig::default(), Arc::new(RecordingSession::default()));
        let mut t = target();
        t.mac = None;

        assert_eq!(
            controller.wake(&t).await,
            Err(HostError::NotConfigured("mac"))
        );
    }

    #[tokio::test]
    async fn shutdown_dispatches_in_background() {
        let session = Arc::new(RecordingSession::default());
        let controller = LanPowerController::new(WakeConfig::default(), Arc::clone(&session));

        let signal = controller.shutdown(&target()).await.unwrap();
        assert_eq!(signal, PowerSignal::ShutdownSent);

        for _ in 0..50 {
            if session.calls.load(Ordering::SeqCst) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("shutdown session was never opened");
    }
}
