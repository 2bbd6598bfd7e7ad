//! Merges per-endpoint device lists into one LLD document.

use std::collections::HashSet;

use rigprobe_miner_api::{Device, QueryError};
use rigprobe_protocol::{DiscoveryData, DiscoveryItem, Family};
use tracing::warn;

use crate::pool::JobOutcome;
use crate::types::{DiscoveryReport, DiscoverySummary, EndpointCandidate};

/// Outcome of querying one discovered endpoint.
pub type DiscoveryOutcome = JobOutcome<EndpointCandidate, Vec<Device>, QueryError>;

/// Builds the report from finished queries.
///
/// Failed endpoints are logged and contribute nothing. Endpoints appear in
/// the order their outcomes are given (completion order when fed from
/// [`WorkerPool::drain`](crate::WorkerPool::drain)); each endpoint's devices
/// keep the daemon's order. A (port, device id) pair appears at most once.
pub fn aggregate(default_family: Family, outcomes: Vec<DiscoveryOutcome>) -> DiscoveryReport {
    let mut summary = DiscoverySummary {
        attempted: outcomes.len(),
        ..Default::default()
    };
    let mut data = DiscoveryData::new();
    let mut seen = HashSet::new();

    for outcome in outcomes {
        let endpoint = outcome.input;
        let family = endpoint.family(default_family);

        let devices = match outcome.result {
            Ok(devices) => {
                summary.succeeded += 1;
                devices
            }
            Err(e) => {
                summary.failed += 1;
                warn!(port = endpoint.port, %family, error = %e, "endpoint query failed");
                continue;
            }
        };

        for device in devices {
            if !seen.insert((endpoint.port, device.id)) {
                continue;
            }
            data.push(device_item(family, endpoint.port, &device));
        }
    }

    DiscoveryReport { data, summary }
}

fn device_item(family: Family, port: u16, device: &Device) -> DiscoveryItem {
    DiscoveryItem::new()
        .with("TYPE", "DEVICE")
        .with("FAMILY", family.as_str())
        .with("PORT", port.to_string())
        .with("DEVID", device.id.to_string())
        .with("NAME", device.display_name(family.as_str()))
}
