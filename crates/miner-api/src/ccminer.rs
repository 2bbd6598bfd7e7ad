//! ccminer text API.
//!
//! ```text
//! REQUEST:  threads
//! RESPONSE: GPU=0;BUS=1;CARD=GeForce GTX 1060;TEMP=61.0;...;KHS=22735.5;ACC=37;REJ=0;HWF=0|GPU=1;...|
//! ```

use std::collections::HashMap;

use crate::cgminer::trim_response;
use crate::device::{Device, to_hashes};
use crate::error::QueryError;

/// Request body for the per-GPU thread list.
pub const THREADS_REQUEST: &[u8] = b"threads";

/// Parses a `threads` response, in daemon order.
///
/// Records without a `GPU` key (e.g. a summary section) are skipped.
pub fn parse_threads(response: &[u8]) -> Result<Vec<Device>, QueryError> {
    let body = std::str::from_utf8(trim_response(response))
        .map_err(|e| QueryError::Parse(format!("response is not UTF-8: {e}")))?;

    let mut devices = Vec::new();
    for record in body.split('|').map(str::trim).filter(|r| !r.is_empty()) {
        let fields = parse_record(record)?;
        let Some(gpu) = fields.get("GPU") else {
            continue;
        };

        let id = gpu
            .parse::<u32>()
            .map_err(|_| QueryError::Parse(format!("invalid GPU id: {gpu:?}")))?;
        let khs = number(&fields, "KHS")?;
        let frequency = match fields.get("GPUF") {
            Some(_) => number(&fields, "GPUF")?,
            None => number(&fields, "FREQ")?,
        };

        devices.push(Device {
            id,
            name: fields.get("CARD").map(|s| s.to_string()).unwrap_or_default(),
            enabled: None,
            status: None,
            temperature: number(&fields, "TEMP")?,
            frequency,
            hashrate: to_hashes(khs, 0.0),
            hashrate_avg: to_hashes(khs, 0.0),
            accepted: number(&fields, "ACC")?,
            rejected: number(&fields, "REJ")?,
            hardware_errors: number(&fields, "HWF")? as u64,
            last_share_difficulty: None,
        });
    }

    if devices.is_empty() && !body.contains("GPU=") && !body.is_empty() {
        return Err(QueryError::Parse(format!(
            "unexpected threads response: {:?}",
            body.chars().take(64).collect::<String>()
        )));
    }

    Ok(devices)
}

fn parse_record(record: &str) -> Result<HashMap<&str, &str>, QueryError> {
    record
        .split(';')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| QueryError::Parse(format!("field without '=': {pair:?}")))
        })
        .collect()
}

fn number(fields: &HashMap<&str, &str>, key: &str) -> Result<f64, QueryError> {
    match fields.get(key) {
        None => Ok(0.0),
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| QueryError::Parse(format!("invalid {key} value: {raw:?}"))),
    }
}
