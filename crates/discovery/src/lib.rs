//! LAN discovery of local mining daemons and fan-out device collection.
//!
//! # Pipeline
//!
//! 1. **Listen**: bind the report port and signal readiness
//! 2. **Probe**: once the listener is ready, send `"<tag>-FTW-<report port>"`
//!    to the family's multicast group
//! 3. **Collect**: decode replies for a fixed window, filtering by source
//! 4. **Query**: fetch each endpoint's device list on a bounded worker pool
//! 5. **Aggregate**: merge device lists into one LLD document
//!
//! Only setup failures (binding the report port, opening the probe socket)
//! fail a run. Malformed replies and per-endpoint query errors just shrink
//! the result.

pub mod aggregate;
pub mod broadcast;
pub mod config;
pub mod discover;
pub mod listener;
pub mod local_addrs;
pub mod pool;
pub mod types;

// Re-export primary types.
pub use aggregate::{DiscoveryOutcome, aggregate};
pub use broadcast::Broadcaster;
pub use config::{DEFAULT_CONCURRENCY, DEFAULT_WINDOW, DiscoveryConfig, SourcePolicy};
pub use discover::discover;
pub use listener::Listener;
pub use local_addrs::LocalAddrs;
pub use pool::{JobError, JobOutcome, WorkerPool};
pub use types::{DiscoveryReport, DiscoverySummary, EndpointCandidate, ListenStats};

use std::net::SocketAddr;

/// Errors that abort a discovery run.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("unable to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to open probe socket: {0}")]
    Probe(#[source] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("discovery task failed: {0}")]
    Task(String),
}
