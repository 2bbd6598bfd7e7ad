//! Device list clients for local mining daemons.
//!
//! Each daemon family exposes its control API on a localhost TCP port:
//!
//! - [`cgminer`]: JSON request/response (`{"command":"devs"}`), shared by
//!   cgminer and sgminer.
//! - [`ccminer`]: plain-text `threads` command answered with `|`-separated
//!   `KEY=VALUE;...` records.
//!
//! Both are normalized into [`Device`] records. [`DeviceQuery`] is the seam
//! the discovery worker pool calls through; [`MinerClient`] is the network
//! implementation.

pub mod ccminer;
pub mod cgminer;
pub mod client;
pub mod device;
pub mod error;

pub use client::{DeviceQuery, MinerClient, QueryFuture};
pub use device::Device;
pub use error::QueryError;

use std::time::Duration;

/// Host the daemons' control APIs listen on.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Timeout for connecting and for the whole request/response exchange.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on a daemon response.
pub const MAX_RESPONSE_SIZE: u64 = 1024 * 1024;
