//! Probe sender.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use rigprobe_protocol::ProbeMessage;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::DiscoveryError;
use crate::config::DiscoveryConfig;

/// Sends one probe datagram per family tag to the multicast group.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    target: SocketAddr,
    tags: Vec<String>,
}

impl Broadcaster {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            target: config.probe_target(),
            tags: config
                .family
                .probe_tags()
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }

    /// Overrides the tags announced in the probe.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Waits for the listener's report port, then sends the probes.
    ///
    /// Returns the number of datagrams sent. If the listener goes away
    /// before becoming ready, nothing is sent.
    pub async fn run(self, ready: oneshot::Receiver<u16>) -> Result<usize, DiscoveryError> {
        let Ok(report_port) = ready.await else {
            debug!("listener not ready; probe skipped");
            return Ok(0);
        };

        let bind_addr = match self.target.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(DiscoveryError::Probe)?;

        let mut sent = 0;
        for tag in &self.tags {
            let probe = ProbeMessage::new(tag.as_str(), report_port);
            match socket.send_to(&probe.encode(), self.target).await {
                Ok(_) => {
                    debug!(dest = %self.target, %probe, "probe sent");
                    sent += 1;
                }
                Err(e) => warn!(dest = %self.target, %probe, error = %e, "probe send failed"),
            }
        }

        Ok(sent)
    }
}
