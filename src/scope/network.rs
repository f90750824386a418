//! Network segments used as scope limitations and exclusions.

use crate::error::{ModelError, ModelResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::IpAddr;

/// An inclusive IPv4 or IPv6 address range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSegment {
    id: u64,
    name: String,
    starting_address: IpAddr,
    ending_address: IpAddr,
}

impl NetworkSegment {
    /// Both ends must parse, share an address family and be in order.
    pub fn new(id: u64, name: impl Into<String>, start: &str, end: &str) -> ModelResult<Self> {
        let starting_address = parse_address(start)?;
        let ending_address = parse_address(end)?;
        if starting_address.is_ipv4() != ending_address.is_ipv4() {
            return Err(ModelError::invalid_data(format!(
                "Segment range mixes address families: {} - {}",
                start, end
            )));
        }
        if starting_address > ending_address {
            return Err(ModelError::invalid_data(format!(
                "Segment starting address {} is after ending address {}",
                start, end
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            starting_address,
            ending_address,
        })
    }

    /// Parse a classic `network_segment` object.
    pub fn from_classic(raw: &Value) -> ModelResult<Self> {
        let id = raw
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| ModelError::missing_data("Network segment is missing 'id'"))?;
        let text = |key: &str| {
            raw.get(key).and_then(Value::as_str).ok_or_else(|| {
                ModelError::missing_data(format!("Network segment is missing '{}'", key))
            })
        };
        Self::new(id, text("name")?, text("starting_address")?, text("ending_address")?)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn starting_address(&self) -> IpAddr {
        self.starting_address
    }

    pub fn ending_address(&self) -> IpAddr {
        self.ending_address
    }

    /// True when the address is in range and of the same family.
    pub fn contains(&self, address: IpAddr) -> bool {
        address.is_ipv4() == self.starting_address.is_ipv4()
            && self.starting_address <= address
            && address <= self.ending_address
    }
}

fn parse_address(text: &str) -> ModelResult<IpAddr> {
    text.trim()
        .parse()
        .map_err(|_| ModelError::invalid_data(format!("'{}' is not an IP address", text)))
}
