//! Per-device scalar metrics.

use std::fmt;

use anyhow::{Result, bail};
use rigprobe_miner_api::Device;
use rigprobe_protocol::Family;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Status,
    Enabled,
    AcceptedShares,
    Rejected,
    HardwareErrors,
    Frequency,
    Hashrate,
    HashrateAvg,
    Temperature,
    LastShareDiff,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Status => "status",
            Metric::Enabled => "enabled",
            Metric::AcceptedShares => "accepted_shares",
            Metric::Rejected => "rejected",
            Metric::HardwareErrors => "hwerrors",
            Metric::Frequency => "frequency",
            Metric::Hashrate => "hashrate",
            Metric::HashrateAvg => "hashrate_av",
            Metric::Temperature => "temperature",
            Metric::LastShareDiff => "lastsharediff",
        }
    }

    /// ccminer's thread summary has no status, enable flag, average rate or
    /// share difficulty.
    pub fn supported_by(self, family: Family) -> bool {
        match self {
            Metric::Status | Metric::Enabled | Metric::HashrateAvg | Metric::LastShareDiff => {
                family == Family::Cgminer
            }
            _ => true,
        }
    }

    pub fn ensure_supported(self, family: Family) -> Result<()> {
        if !self.supported_by(family) {
            bail!("{self} is not reported by {family}");
        }
        Ok(())
    }

    /// Formats the metric's value for `device`.
    pub fn read(self, family: Family, device: &Device) -> Result<String> {
        self.ensure_supported(family)?;

        let value = match self {
            Metric::Status => device.status.clone(),
            Metric::Enabled => device.enabled.map(|e| u8::from(e).to_string()),
            Metric::AcceptedShares => Some(device.accepted.to_string()),
            Metric::Rejected => Some(device.rejected.to_string()),
            Metric::HardwareErrors => Some(device.hardware_errors.to_string()),
            Metric::Frequency => Some(device.frequency.to_string()),
            Metric::Hashrate => Some(device.hashrate.to_string()),
            Metric::HashrateAvg => Some(device.hashrate_avg.to_string()),
            Metric::Temperature => Some(device.temperature.to_string()),
            Metric::LastShareDiff => device.last_share_difficulty.map(|d| d.to_string()),
        };

        match value {
            Some(v) => Ok(v),
            None => bail!("device {} did not report {self}", device.id),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
