use std::net::SocketAddr;

use rigprobe_protocol::{DiscoveryData, Family, ProbeMessage};

/// A daemon endpoint announced by a reply datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    /// Tag from the reply, used to pick the query protocol.
    pub tag: String,
    /// Local control port the daemon listens on.
    pub port: u16,
    /// Sender of the reply.
    pub source: SocketAddr,
}

impl EndpointCandidate {
    pub fn from_probe(msg: ProbeMessage, source: SocketAddr) -> Self {
        Self {
            tag: msg.tag,
            port: msg.port,
            source,
        }
    }

    /// Family to query, falling back to `default` for unknown tags.
    pub fn family(&self, default: Family) -> Family {
        Family::from_tag(&self.tag).unwrap_or(default)
    }
}

/// Counters from one listen window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenStats {
    pub received: usize,
    pub accepted: usize,
    pub dropped: usize,
    pub errors: usize,
}

/// Per-run endpoint counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of a discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub data: DiscoveryData,
    pub summary: DiscoverySummary,
}
