// ── Merge ──
//
// Folds one switch's report into the cache. Append-only: merging the same
// report twice records every location twice.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::TopologyCache;
use crate::model::{MacAddress, MacLocation, SwitchReport};

/// Non-fatal topology inconsistency. Logged, never returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyWarning {
    /// One MAC resolved to two different nodes. `current` replaced `previous`.
    NodeConflict {
        mac: MacAddress,
        previous: String,
        current: String,
    },
    /// Two nodes declare the same port label on one switch. `current` wins.
    DuplicatePort {
        switch: String,
        label: String,
        previous: String,
        current: String,
    },
}

impl TopologyWarning {
    pub(crate) fn log(&self) {
        match self {
            Self::NodeConflict {
                mac,
                previous,
                current,
            } => warn!(%mac, %previous, %current, "MAC resolves to more than one node"),
            Self::DuplicatePort {
                switch,
                label,
                previous,
                current,
            } => warn!(
                %switch,
                %label,
                %previous,
                %current,
                "port label declared by more than one node"
            ),
        }
    }
}

impl fmt::Display for TopologyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeConflict {
                mac,
                previous,
                current,
            } => write!(f, "{mac} resolves to both {previous} and {current}"),
            Self::DuplicatePort {
                switch,
                label,
                previous,
                current,
            } => write!(
                f,
                "{previous} and {current} both declare port {label} on {switch}"
            ),
        }
    }
}

impl TopologyCache {
    /// Apply one completed switch interrogation.
    ///
    /// Serialized against other merges; readers may see the report half
    /// applied. Returns (and logs) any node conflicts it overwrote.
    pub fn merge(&self, report: &SwitchReport) -> Vec<TopologyWarning> {
        let _guard = self.lock();
        let mut warnings = Vec::new();

        {
            let mut interfaces = self.macs_by_switch.entry(report.switch.clone()).or_default();
            for obs in &report.observations {
                interfaces
                    .entry(obs.interface.clone())
                    .or_default()
                    .push(obs.mac);
            }
        }

        for obs in &report.observations {
            self.mac_locations.entry(obs.mac).or_default().push(MacLocation {
                switch: report.switch.clone(),
                interface: obs.interface.clone(),
                ambiguity: obs.ambiguity,
            });

            let Some(node) = &obs.node else { continue };
            if let Some(previous) = self.nodes_by_mac.insert(obs.mac, node.clone()) {
                if previous != *node {
                    let warning = TopologyWarning::NodeConflict {
                        mac: obs.mac,
                        previous,
                        current: node.clone(),
                    };
                    warning.log();
                    warnings.push(warning);
                }
            }
        }

        self.bump_version();
        warnings
    }
}
