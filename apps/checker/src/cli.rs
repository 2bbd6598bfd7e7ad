use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rigprobe_protocol::Family;

use crate::metrics::Metric;

#[derive(Debug, Parser)]
#[command(name = "rigprobe", version)]
#[command(about = "Discovers local mining daemons and reports per-device metrics.")]
pub struct Cli {
    /// Daemon family to probe and query
    #[arg(long, global = true, value_name = "cgminer|ccminer")]
    pub family: Option<Family>,

    /// Configuration file (default: ~/.config/rigprobe/checker.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Timeout for each device query
    #[arg(long, global = true, value_name = "MS")]
    pub query_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Positional arguments of the metric subcommands.
#[derive(Debug, Clone, Copy, Args)]
pub struct DeviceArgs {
    /// Control port of the daemon
    #[arg(value_name = "PORT")]
    pub port: u16,

    /// Device id, as published in discovery's `{#DEVID}`
    #[arg(value_name = "DEVICEID")]
    pub device: u32,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover daemons and print their devices as an LLD document
    Discovery {
        /// How long to collect replies
        #[arg(long, value_name = "MS")]
        window_ms: Option<u64>,
    },
    /// Device status
    Status(DeviceArgs),
    /// 1 if the device is enabled, 0 otherwise
    Enabled(DeviceArgs),
    /// Accepted shares (difficulty for cgminer)
    #[command(name = "accepted_shares", alias = "accept_shares")]
    AcceptedShares(DeviceArgs),
    /// Rejected shares
    #[command(alias = "rejected_shares")]
    Rejected(DeviceArgs),
    /// Hardware error count
    Hwerrors(DeviceArgs),
    /// Clock frequency
    Frequency(DeviceArgs),
    /// Short-window hash rate in H/s
    Hashrate(DeviceArgs),
    /// Average hash rate in H/s
    #[command(name = "hashrate_av")]
    HashrateAv(DeviceArgs),
    /// Device temperature
    Temperature(DeviceArgs),
    /// Difficulty of the last submitted share
    Lastsharediff(DeviceArgs),
}

impl Command {
    /// The metric and device a metric subcommand asks for.
    pub fn metric(&self) -> Option<(Metric, DeviceArgs)> {
        let (metric, args) = match self {
            Command::Discovery { .. } => return None,
            Command::Status(a) => (Metric::Status, a),
            Command::Enabled(a) => (Metric::Enabled, a),
            Command::AcceptedShares(a) => (Metric::AcceptedShares, a),
            Command::Rejected(a) => (Metric::Rejected, a),
            Command::Hwerrors(a) => (Metric::HardwareErrors, a),
            Command::Frequency(a) => (Metric::Frequency, a),
            Command::Hashrate(a) => (Metric::Hashrate, a),
            Command::HashrateAv(a) => (Metric::HashrateAvg, a),
            Command::Temperature(a) => (Metric::Temperature, a),
            Command::Lastsharediff(a) => (Metric::LastShareDiff, a),
        };
        Some((metric, *args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rigprobe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn discovery_with_globals() {
        let cli = parse(&["--family", "ccminer", "--debug", "discovery", "--window-ms", "500"]);
        assert_eq!(cli.family, Some(Family::Ccminer));
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Discovery { window_ms: Some(500) }));
        assert!(cli.command.metric().is_none());
    }

    #[test]
    fn metric_subcommands() {
        let cli = parse(&["hashrate_av", "4028", "1"]);
        let (metric, args) = cli.command.metric().unwrap();
        assert_eq!(metric, Metric::HashrateAvg);
        assert_eq!(args.port, 4028);
        assert_eq!(args.device, 1);

        let cli = parse(&["temperature", "4068", "0", "--query-timeout-ms", "250"]);
        assert_eq!(cli.query_timeout_ms, Some(250));
        assert_eq!(cli.command.metric().unwrap().0, Metric::Temperature);
    }

    #[test]
    fn legacy_aliases() {
        let cli = parse(&["accept_shares", "4028", "0"]);
        assert_eq!(cli.command.metric().unwrap().0, Metric::AcceptedShares);

        let cli = parse(&["rejected_shares", "4068", "0"]);
        assert_eq!(cli.command.metric().unwrap().0, Metric::Rejected);
    }

    #[test]
    fn rejects_bad_arguments() {
        let bad = |args: &[&str]| {
            Cli::try_parse_from(std::iter::once("rigprobe").chain(args.iter().copied())).is_err()
        };
        assert!(bad(&["status", "4028"]));
        assert!(bad(&["status", "notaport", "0"]));
        assert!(bad(&["status", "4028", "-1"]));
        assert!(bad(&["--family", "bfgminer", "discovery"]));
        assert!(bad(&["bogus"]));
    }
}
