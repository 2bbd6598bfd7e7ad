//! cgminer/sgminer JSON API.
//!
//! ```text
//! REQUEST:  {"command":"devs"}
//! RESPONSE: {"STATUS":[{"STATUS":"S",...}],"DEVS":[{...},...],"id":1}\0
//! ```

use serde::Deserialize;

use crate::device::{Device, to_hashes};
use crate::error::QueryError;

/// Request body for the device list.
pub const DEVS_REQUEST: &[u8] = br#"{"command":"devs"}"#;

#[derive(Debug, Deserialize)]
struct DevsResponse {
    #[serde(rename = "STATUS", default)]
    status: Vec<Status>,
    #[serde(rename = "DEVS", default)]
    devs: Option<Vec<RawDevice>>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(rename = "STATUS", default)]
    status: String,
    #[serde(rename = "Msg", default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    #[serde(rename = "ID")]
    id: Option<u32>,
    #[serde(rename = "GPU")]
    gpu: Option<u32>,
    #[serde(rename = "ASC")]
    asc: Option<u32>,
    #[serde(rename = "PGA")]
    pga: Option<u32>,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Enabled")]
    enabled: Option<String>,
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "Temperature", default)]
    temperature: f64,
    #[serde(rename = "Frequency", alias = "GPU Clock", default)]
    frequency: f64,
    #[serde(rename = "MHS 5s", default)]
    mhs_5s: f64,
    #[serde(rename = "KHS 5s", default)]
    khs_5s: f64,
    #[serde(rename = "MHS av", default)]
    mhs_av: f64,
    #[serde(rename = "KHS av", default)]
    khs_av: f64,
    #[serde(rename = "Difficulty Accepted", default)]
    difficulty_accepted: f64,
    #[serde(rename = "Device Rejected%", default)]
    device_rejected: f64,
    #[serde(rename = "Hardware Errors", default)]
    hardware_errors: u64,
    #[serde(rename = "Last Share Difficulty")]
    last_share_difficulty: Option<f64>,
}

impl RawDevice {
    fn into_device(self, index: usize) -> Device {
        let id = self
            .id
            .or(self.gpu)
            .or(self.asc)
            .or(self.pga)
            .unwrap_or(index as u32);

        Device {
            id,
            name: self.name,
            enabled: self.enabled.map(|e| e == "Y"),
            status: self.status,
            temperature: self.temperature,
            frequency: self.frequency,
            hashrate: to_hashes(self.khs_5s, self.mhs_5s),
            hashrate_avg: to_hashes(self.khs_av, self.mhs_av),
            accepted: self.difficulty_accepted,
            rejected: self.device_rejected,
            hardware_errors: self.hardware_errors,
            last_share_difficulty: self.last_share_difficulty,
        }
    }
}

/// Parses a `devs` response, in daemon order.
pub fn parse_devs(response: &[u8]) -> Result<Vec<Device>, QueryError> {
    let body = trim_response(response);
    if body.is_empty() {
        return Err(QueryError::Parse("empty response".into()));
    }

    let parsed: DevsResponse = serde_json::from_slice(body)?;

    if let Some(status) = parsed.status.first()
        && matches!(status.status.as_str(), "E" | "F")
    {
        return Err(QueryError::Api(status.msg.clone()));
    }

    let devs = parsed
        .devs
        .ok_or_else(|| QueryError::Parse("response has no DEVS section".into()))?;

    Ok(devs
        .into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_device(i))
        .collect())
}

/// Strips the trailing NUL terminator and whitespace cgminer appends.
pub(crate) fn trim_response(response: &[u8]) -> &[u8] {
    let end = response
        .iter()
        .rposition(|b| !matches!(b, b'\0' | b'\r' | b'\n' | b' '))
        .map_or(0, |i| i + 1);
    &response[..end]
}
