use std::net::Ipv4Addr;

/// Multicast group the mining daemons join for API discovery.
pub const MCAST_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 75);

/// Code word carried in the middle field of every probe datagram.
pub const MCAST_CODE: &str = "FTW";

/// Probe port for the cgminer/sgminer API.
pub const CGMINER_PROBE_PORT: u16 = 4028;

/// Report port the cgminer/sgminer replies are sent to.
pub const CGMINER_REPORT_PORT: u16 = 4027;

/// Probe port for the ccminer API.
pub const CCMINER_PROBE_PORT: u16 = 4068;

/// Report port the ccminer replies are sent to.
pub const CCMINER_REPORT_PORT: u16 = 4067;

/// Largest datagram the listener accepts.
pub const MAX_DATAGRAM_SIZE: usize = 8192;
