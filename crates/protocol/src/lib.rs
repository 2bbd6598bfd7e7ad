//! Wire formats shared by the rigprobe checkers.
//!
//! - [`probe`]: the `"<tag>-FTW-<port>"` datagrams exchanged with mining
//!   daemons during LAN discovery.
//! - [`lld`]: the low-level discovery document handed to the monitoring
//!   system.

pub mod constants;
pub mod lld;
pub mod probe;
pub mod types;

// Re-export primary types for convenience.
pub use lld::{DiscoveryData, DiscoveryItem, LldError, macro_name};
pub use probe::{ProbeDecodeError, ProbeMessage};
pub use types::Family;
