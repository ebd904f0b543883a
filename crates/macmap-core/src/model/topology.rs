// ── Topology observations ──
//
// What one switch interrogation produces and what the cache stores per MAC.

use indexmap::IndexMap;
use macmap_snmp::Credentials;
use serde::{Deserialize, Serialize};

use super::MacAddress;

/// One place a MAC address was learned.
///
/// `ambiguity` is the number of distinct MACs the switch attributed to the
/// same interface during that scan; anything above 1 means the interface is
/// not a single-endpoint access port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacLocation {
    pub switch: String,
    pub interface: String,
    pub ambiguity: usize,
}

impl MacLocation {
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguity > 1
    }
}

/// A MAC resolved to an interface (and possibly a configured node) on one switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacObservation {
    pub mac: MacAddress,
    pub interface: String,
    pub ambiguity: usize,
    pub node: Option<String>,
}

/// Everything one switch interrogation learned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchReport {
    pub switch: String,
    /// One entry per learned MAC, in forwarding-table walk order.
    pub observations: Vec<MacObservation>,
    /// Distinct MACs per resolved interface name.
    pub ambiguity: IndexMap<String, usize>,
}

impl SwitchReport {
    pub fn new(switch: impl Into<String>) -> Self {
        Self {
            switch: switch.into(),
            ..Self::default()
        }
    }

    pub fn mac_count(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Completion marker yielded by a rebuild once a switch's task has finished
/// and its data (if any) has been merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCompletion {
    pub switch: String,
    /// MACs merged from this switch; zero when the interrogation failed.
    pub macs: usize,
}

/// A switch to interrogate, with the credentials to use.
#[derive(Debug, Clone)]
pub struct SwitchTarget {
    pub address: String,
    pub credentials: Credentials,
}

impl SwitchTarget {
    pub fn new(address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            address: address.into(),
            credentials,
        }
    }
}
