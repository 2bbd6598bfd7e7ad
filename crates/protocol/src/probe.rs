//! Probe datagram format.
//!
//! ```text
//! PROBE (checker -> multicast group):  <tag>-FTW-<report port>
//! REPLY (daemon -> report port):       <tag>-FTW-<api port>[-<description>]
//! ```
//!
//! Only the third hyphen-delimited field is interpreted on decode. The code
//! word is not checked, and anything past the port is ignored.

use std::fmt;

use crate::constants::MCAST_CODE;

/// Reasons a datagram payload is not a probe message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeDecodeError {
    #[error("payload is not UTF-8")]
    NotUtf8,

    #[error("expected at least 3 fields, got {0}")]
    TooFewFields(usize),

    #[error("invalid port field: {0:?}")]
    InvalidPort(String),
}

/// A decoded `"<tag>-FTW-<port>"` datagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeMessage {
    pub tag: String,
    pub port: u16,
}

impl ProbeMessage {
    pub fn new(tag: impl Into<String>, port: u16) -> Self {
        Self {
            tag: tag.into(),
            port,
        }
    }

    /// Encodes the message as datagram bytes.
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Decodes a datagram payload.
    pub fn decode(payload: &[u8]) -> Result<Self, ProbeDecodeError> {
        let text = std::str::from_utf8(payload).map_err(|_| ProbeDecodeError::NotUtf8)?;
        Self::parse(text)
    }

    /// Parses the textual form.
    pub fn parse(text: &str) -> Result<Self, ProbeDecodeError> {
        let fields: Vec<&str> = text.split('-').collect();
        if fields.len() < 3 {
            return Err(ProbeDecodeError::TooFewFields(fields.len()));
        }

        let raw_port = fields[2].trim_end_matches(['\0', '\r', '\n']);
        let port = raw_port
            .parse::<u16>()
            .map_err(|_| ProbeDecodeError::InvalidPort(raw_port.to_string()))?;

        Ok(Self {
            tag: fields[0].to_string(),
            port,
        })
    }
}

impl fmt::Display for ProbeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{MCAST_CODE}-{}", self.tag, self.port)
    }
}
