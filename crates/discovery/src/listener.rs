//! Reply collector for the discovery window.

use std::net::SocketAddr;
use std::time::Duration;

use rigprobe_protocol::ProbeMessage;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::DiscoveryError;
use crate::config::{DiscoveryConfig, SourcePolicy};
use crate::local_addrs::LocalAddrs;
use crate::types::{EndpointCandidate, ListenStats};

/// Receive errors in a row after which the window is closed early.
const MAX_CONSECUTIVE_ERRORS: u32 = 8;

/// Pause before receiving again after an error.
const ERROR_BACKOFF: Duration = Duration::from_millis(20);

/// UDP listener bound to the report port.
pub struct Listener {
    socket: UdpSocket,
    window: Duration,
    max_datagram_size: usize,
    policy: SourcePolicy,
    local: LocalAddrs,
}

impl Listener {
    /// Binds the report port and snapshots the local interface addresses.
    pub async fn bind(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let addr = config.listen_socket_addr();
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| DiscoveryError::Bind { addr, source })?;

        debug!(%addr, "listening for discovery replies");

        Ok(Self {
            socket,
            window: config.window,
            max_datagram_size: config.max_datagram_size,
            policy: config.source_policy,
            local: LocalAddrs::snapshot(),
        })
    }

    /// Replaces the interface snapshot used by the source filter.
    pub fn with_local_addrs(mut self, local: LocalAddrs) -> Self {
        self.local = local;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Decodes a datagram and applies the source policy.
    pub fn admit(&self, payload: &[u8], source: SocketAddr) -> Option<EndpointCandidate> {
        if payload.len() > self.max_datagram_size {
            trace!(%source, len = payload.len(), "oversized datagram dropped");
            return None;
        }

        let message = match ProbeMessage::decode(payload) {
            Ok(m) => m,
            Err(e) => {
                trace!(%source, error = %e, "undecodable datagram dropped");
                return None;
            }
        };

        if !self.policy.admits(source.ip(), &self.local) {
            trace!(%source, policy = ?self.policy, "datagram rejected by source policy");
            return None;
        }

        Some(EndpointCandidate::from_probe(message, source))
    }

    /// Receives replies until the window closes, forwarding candidates.
    ///
    /// The window starts when this is called. Stops early if the receiving
    /// side of `candidates` is dropped.
    pub async fn run(self, candidates: mpsc::Sender<EndpointCandidate>) -> ListenStats {
        let deadline = Instant::now() + self.window;
        // One extra byte so a datagram filling the buffer is detectably oversized.
        let mut buf = vec![0u8; self.max_datagram_size + 1];
        let mut stats = ListenStats::default();
        let mut consecutive_errors = 0;

        loop {
            let (len, source) =
                match tokio::time::timeout_at(deadline, self.socket.recv_from(&mut buf)).await {
                    Ok(Ok(r)) => r,
                    Ok(Err(e)) => {
                        stats.errors += 1;
                        consecutive_errors += 1;
                        match retry_at(consecutive_errors, Instant::now(), deadline) {
                            Some(at) => {
                                debug!(error = %e, "receive failed");
                                tokio::time::sleep_until(at).await;
                                continue;
                            }
                            None => {
                                warn!(error = %e, errors = consecutive_errors, "receive keeps failing, closing window early");
                                break;
                            }
                        }
                    }
                    Err(_) => break,
                };

            consecutive_errors = 0;
            stats.received += 1;
            match self.admit(&buf[..len], source) {
                Some(candidate) => {
                    debug!(%source, tag = %candidate.tag, port = candidate.port, "endpoint announced");
                    stats.accepted += 1;
                    if candidates.send(candidate).await.is_err() {
                        break;
                    }
                }
                None => stats.dropped += 1,
            }
        }

        debug!(?stats, "discovery window closed");
        stats
    }
}

/// When to receive again after `consecutive` errors in a row, or `None`
/// once the socket is treated as broken. Never later than `deadline`.
fn retry_at(consecutive: u32, now: Instant, deadline: Instant) -> Option<Instant> {
    if consecutive >= MAX_CONSECUTIVE_ERRORS {
        return None;
    }
    Some((now + ERROR_BACKOFF).min(deadline))
}
