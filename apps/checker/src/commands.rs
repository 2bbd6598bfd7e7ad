use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rigprobe_discovery::{DiscoveryConfig, discover};
use rigprobe_miner_api::MinerClient;
use rigprobe_protocol::Family;

use crate::cli::{Cli, Command, DeviceArgs};
use crate::config::Config;
use crate::metrics::Metric;

/// Runs the selected subcommand and returns what goes to stdout.
pub async fn run(cli: &Cli) -> Result<String> {
    let config = Config::resolve(cli.config.as_deref())?;
    let family = cli.family.or(config.family).unwrap_or_default();

    let mut client = config.client();
    if let Some(ms) = cli.query_timeout_ms {
        client = client.with_timeout(Duration::from_millis(ms));
    }

    match &cli.command {
        Command::Discovery { window_ms } => {
            let mut discovery = config.discovery_config(family);
            if let Some(ms) = window_ms {
                discovery.window = Duration::from_millis(*ms);
            }
            run_discovery(&discovery, client).await
        }
        command => match command.metric() {
            Some((metric, args)) => read_metric(&client, family, metric, args).await,
            None => bail!("{command:?} is not a metric"),
        },
    }
}

/// Discovers endpoints and renders the LLD document.
pub async fn run_discovery(config: &DiscoveryConfig, client: MinerClient) -> Result<String> {
    let report = discover(config, Arc::new(client))
        .await
        .context("discovery failed")?;
    Ok(report.data.to_json()?)
}

/// Queries one device and formats one metric.
pub async fn read_metric(
    client: &MinerClient,
    family: Family,
    metric: Metric,
    args: DeviceArgs,
) -> Result<String> {
    metric.ensure_supported(family)?;
    let device = client.device(family, args.port, args.device).await?;
    metric.read(family, &device)
}
