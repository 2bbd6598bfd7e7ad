use std::collections::HashSet;
use std::net::IpAddr;

use tracing::warn;

/// Snapshot of this host's non-loopback interface addresses.
///
/// Taken once per run. If enumeration fails the snapshot is marked
/// unavailable and no address is considered local.
#[derive(Debug, Clone, Default)]
pub struct LocalAddrs {
    addrs: HashSet<IpAddr>,
    available: bool,
}

impl LocalAddrs {
    /// Enumerates the local interfaces.
    pub fn snapshot() -> Self {
        match if_addrs::get_if_addrs() {
            Ok(interfaces) => Self::from_addrs(
                interfaces
                    .into_iter()
                    .filter(|iface| !iface.is_loopback())
                    .map(|iface| iface.ip()),
            ),
            Err(e) => {
                warn!(error = %e, "unable to enumerate local interfaces; source filter disabled");
                Self::unavailable()
            }
        }
    }

    /// Builds a snapshot from known addresses. Loopback addresses are ignored.
    pub fn from_addrs(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            addrs: addrs
                .into_iter()
                .map(canonical)
                .filter(|ip| !ip.is_loopback())
                .collect(),
            available: true,
        }
    }

    /// A snapshot for which enumeration failed.
    pub fn unavailable() -> Self {
        Self {
            addrs: HashSet::new(),
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Returns true if `ip` is one of this host's non-loopback addresses.
    pub fn is_local(&self, ip: IpAddr) -> bool {
        self.addrs.contains(&canonical(ip))
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

/// Maps IPv4-mapped IPv6 addresses back to IPv4 so both forms compare equal.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        v4 => v4,
    }
}
