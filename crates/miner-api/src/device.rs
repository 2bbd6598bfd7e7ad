use serde::Serialize;

/// One mining device as reported by its daemon.
///
/// Hash rates are in H/s. Fields a family does not report are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Device {
    pub id: u32,
    pub name: String,
    pub enabled: Option<bool>,
    pub status: Option<String>,
    pub temperature: f64,
    pub frequency: f64,
    /// Short-window hash rate (5s for cgminer, current for ccminer).
    pub hashrate: f64,
    pub hashrate_avg: f64,
    /// cgminer: accepted difficulty; ccminer: accepted share count.
    pub accepted: f64,
    /// cgminer: device rejected percentage; ccminer: rejected share count.
    pub rejected: f64,
    pub hardware_errors: u64,
    pub last_share_difficulty: Option<f64>,
}

impl Device {
    /// Display name, falling back to `"<family> <id>"` when the daemon
    /// reports none.
    pub fn display_name(&self, family: &str) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("{family} {}", self.id)
        } else {
            name.to_string()
        }
    }
}

/// Converts a KH/s + MH/s pair into H/s, preferring a positive KH/s value.
pub(crate) fn to_hashes(khs: f64, mhs: f64) -> f64 {
    if khs > 0.0 {
        khs * 1_000.0
    } else {
        mhs * 1_000_000.0
    }
}
