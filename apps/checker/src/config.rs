//! Checker configuration.
//!
//! Reads optional TOML at `~/.config/rigprobe/checker.toml` (or `--config`).
//! Every key is optional; anything left out keeps the family default.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rigprobe_discovery::{DEFAULT_CONCURRENCY, DEFAULT_WINDOW, DiscoveryConfig, SourcePolicy};
use rigprobe_miner_api::{DEFAULT_HOST, DEFAULT_QUERY_TIMEOUT, MinerClient};
use rigprobe_protocol::Family;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub family: Option<Family>,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub query: QuerySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoverySection {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub source_policy: SourcePolicy,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,
    /// Overrides the family's multicast group.
    #[serde(default)]
    pub multicast_group: Option<IpAddr>,
    #[serde(default)]
    pub probe_port: Option<u16>,
    #[serde(default)]
    pub report_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_window_ms() -> u64 {
    DEFAULT_WINDOW.as_millis() as u64
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_listen_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_millis() as u64
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            concurrency: default_concurrency(),
            source_policy: SourcePolicy::default(),
            listen_addr: default_listen_addr(),
            multicast_group: None,
            probe_port: None,
            report_port: None,
        }
    }
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            host: default_host(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Config {
    /// Loads a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Loads `explicit` if given (it must exist), else the default path if
    /// present, else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using default config file");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Discovery parameters for `family` with file overrides applied.
    pub fn discovery_config(&self, family: Family) -> DiscoveryConfig {
        let d = &self.discovery;
        let mut config = DiscoveryConfig::for_family(family);
        config.window = Duration::from_millis(d.window_ms);
        config.concurrency = d.concurrency;
        config.source_policy = d.source_policy;
        config.listen_addr = d.listen_addr;
        if let Some(group) = d.multicast_group {
            config.multicast_group = group;
        }
        if let Some(port) = d.probe_port {
            config.probe_port = port;
        }
        if let Some(port) = d.report_port {
            config.report_port = port;
        }
        config
    }

    pub fn client(&self) -> MinerClient {
        MinerClient::new()
            .with_host(self.query.host.clone())
            .with_timeout(Duration::from_millis(self.query.timeout_ms))
    }
}

/// `~/.config/rigprobe/checker.toml`, when a home directory is known.
pub fn default_path() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };
    base.map(|dir| dir.join("rigprobe").join("checker.toml"))
}
