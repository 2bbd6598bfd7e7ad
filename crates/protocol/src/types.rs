use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CCMINER_PROBE_PORT, CCMINER_REPORT_PORT, CGMINER_PROBE_PORT, CGMINER_REPORT_PORT, MCAST_GROUP,
};

/// A family of mining daemons sharing one control-port protocol.
///
/// cgminer and sgminer speak the same JSON API and answer the same probe,
/// so they form a single family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    #[default]
    Cgminer,
    Ccminer,
}

impl Family {
    /// Probe tags broadcast for this family, one datagram each.
    pub fn probe_tags(self) -> &'static [&'static str] {
        match self {
            Family::Cgminer => &["cgminer", "sgminer"],
            Family::Ccminer => &["ccminer"],
        }
    }

    /// Default multicast group the family's daemons listen on.
    pub fn multicast_group(self) -> Ipv4Addr {
        MCAST_GROUP
    }

    /// Default probe port.
    pub fn probe_port(self) -> u16 {
        match self {
            Family::Cgminer => CGMINER_PROBE_PORT,
            Family::Ccminer => CCMINER_PROBE_PORT,
        }
    }

    /// Default report port the replies are sent to.
    pub fn report_port(self) -> u16 {
        match self {
            Family::Cgminer => CGMINER_REPORT_PORT,
            Family::Ccminer => CCMINER_REPORT_PORT,
        }
    }

    /// Routes a reply tag to its family.
    ///
    /// Daemons answer with either the long tag (`cgminer`) or the short
    /// one (`cgm`). Matching ignores case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "cgminer" | "cgm" | "sgminer" | "sgm" => Some(Family::Cgminer),
            "ccminer" | "ccm" => Some(Family::Ccminer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Cgminer => "cgminer",
            Family::Ccminer => "ccminer",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cgminer" | "sgminer" => Ok(Family::Cgminer),
            "ccminer" => Ok(Family::Ccminer),
            other => Err(format!("unknown daemon family: {other}")),
        }
    }
}
