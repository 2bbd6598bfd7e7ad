use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use rigprobe_protocol::Family;
use rigprobe_protocol::constants::MAX_DATAGRAM_SIZE;
use serde::{Deserialize, Serialize};

use crate::DiscoveryError;
use crate::local_addrs::LocalAddrs;

/// How long the listener collects replies.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(2);

/// Maximum number of endpoints queried at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Which reply sources the listener accepts.
///
/// Device queries always go to the loopback host, so by default only
/// replies sent from one of this host's own interface addresses are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePolicy {
    /// Keep replies from this host only.
    #[default]
    LocalOnly,
    /// Drop replies from this host (echoes of our own probe).
    DiscardLocal,
    /// Keep everything.
    Any,
}

impl SourcePolicy {
    /// Whether a reply from `source` passes the policy.
    ///
    /// Loopback sources count as local. When interface enumeration failed
    /// the policy is not applied.
    pub fn admits(self, source: IpAddr, local: &LocalAddrs) -> bool {
        if !local.is_available() {
            return true;
        }
        let from_self = source.is_loopback() || local.is_local(source);
        match self {
            SourcePolicy::LocalOnly => from_self,
            SourcePolicy::DiscardLocal => !from_self,
            SourcePolicy::Any => true,
        }
    }
}

/// Parameters of one discovery run.
///
/// Built once at startup and passed to every component.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Family probed, and the fallback for replies with unknown tags.
    pub family: Family,
    pub multicast_group: IpAddr,
    pub probe_port: u16,
    /// Port the listener binds (0 = OS-assigned).
    pub report_port: u16,
    pub listen_addr: IpAddr,
    pub window: Duration,
    pub max_datagram_size: usize,
    pub concurrency: usize,
    pub source_policy: SourcePolicy,
}

impl DiscoveryConfig {
    /// Compile-time defaults for a daemon family.
    pub fn for_family(family: Family) -> Self {
        Self {
            family,
            multicast_group: IpAddr::V4(family.multicast_group()),
            probe_port: family.probe_port(),
            report_port: family.report_port(),
            listen_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            window: DEFAULT_WINDOW,
            max_datagram_size: MAX_DATAGRAM_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            source_policy: SourcePolicy::default(),
        }
    }

    /// Where probe datagrams are sent.
    pub fn probe_target(&self) -> SocketAddr {
        SocketAddr::new(self.multicast_group, self.probe_port)
    }

    /// Where the listener binds.
    pub fn listen_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.report_port)
    }

    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.concurrency == 0 {
            return Err(DiscoveryError::Config("concurrency must be at least 1".into()));
        }
        if self.window.is_zero() {
            return Err(DiscoveryError::Config("discovery window must be non-zero".into()));
        }
        if self.max_datagram_size == 0 {
            return Err(DiscoveryError::Config("datagram buffer must be non-empty".into()));
        }
        Ok(())
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::for_family(Family::default())
    }
}
