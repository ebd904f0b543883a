// ── Topology cache ──
//
// The four shared maps a rebuild fills in, with lock-free point lookups
// that are safe to call at any time, including mid-rebuild.

mod merge;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::watch;

use crate::model::{MacAddress, MacLocation};

pub use merge::TopologyWarning;

/// Declared port label → node, in declaration order.
pub type PortMap = IndexMap<String, String>;

/// Shared, injectable MAC-to-switchport topology.
///
/// Writers (`merge`, `clear`, `set_switch_ports`) serialize on an internal
/// merge lock; readers never take it and may observe a rebuild in progress.
/// Every mutation bumps a version counter that [`subscribe`](Self::subscribe)
/// exposes.
pub struct TopologyCache {
    /// MAC → every (switch, interface, ambiguity) it was learned on.
    mac_locations: DashMap<MacAddress, Vec<MacLocation>>,

    /// Switch → interface name → MACs learned there.
    macs_by_switch: DashMap<String, IndexMap<String, Vec<MacAddress>>>,

    /// MAC → node resolved via declared port bindings (last writer wins).
    nodes_by_mac: DashMap<MacAddress, String>,

    /// Switch → declared port label → node. Read-only during a scan.
    switch_ports: DashMap<String, Arc<PortMap>>,

    merge_lock: Mutex<()>,

    version: watch::Sender<u64>,

    last_rebuild: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for TopologyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TopologyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyCache")
            .field("macs", &self.mac_locations.len())
            .field("switches", &self.macs_by_switch.len())
            .field("nodes", &self.nodes_by_mac.len())
            .field("version", &*self.version.borrow())
            .finish_non_exhaustive()
    }
}

impl TopologyCache {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (last_rebuild, _) = watch::channel(None);

        Self {
            mac_locations: DashMap::new(),
            macs_by_switch: DashMap::new(),
            nodes_by_mac: DashMap::new(),
            switch_ports: DashMap::new(),
            merge_lock: Mutex::new(()),
            version,
            last_rebuild,
        }
    }

    // ── Writers ──────────────────────────────────────────────────────

    /// Empty all four structures.
    pub fn clear(&self) {
        let _guard = self.lock();
        self.mac_locations.clear();
        self.macs_by_switch.clear();
        self.nodes_by_mac.clear();
        self.switch_ports.clear();
        self.bump_version();
    }

    /// Install the declared port bindings built from configuration.
    pub fn set_switch_ports(&self, ports: impl IntoIterator<Item = (String, PortMap)>) {
        let _guard = self.lock();
        self.switch_ports.clear();
        for (switch, map) in ports {
            self.switch_ports.insert(switch, Arc::new(map));
        }
        self.bump_version();
    }

    /// Record that a full rebuild has run to completion.
    pub fn mark_rebuilt(&self) {
        self.last_rebuild.send_replace(Some(Utc::now()));
        self.bump_version();
    }

    // ── Readers ──────────────────────────────────────────────────────

    /// Every place `mac` was learned, in merge order.
    pub fn locations(&self, mac: &MacAddress) -> Vec<MacLocation> {
        self.mac_locations
            .get(mac)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn node_for_mac(&self, mac: &MacAddress) -> Option<String> {
        self.nodes_by_mac.get(mac).map(|r| r.value().clone())
    }

    /// MACs currently attributed to `node`, sorted.
    pub fn macs_for_node(&self, node: &str) -> Vec<MacAddress> {
        let mut macs: Vec<MacAddress> = self
            .nodes_by_mac
            .iter()
            .filter(|r| r.value() == node)
            .map(|r| *r.key())
            .collect();
        macs.sort_unstable();
        macs
    }

    pub fn macs_on_interface(&self, switch: &str, interface: &str) -> Vec<MacAddress> {
        self.macs_by_switch
            .get(switch)
            .and_then(|r| r.value().get(interface).cloned())
            .unwrap_or_default()
    }

    /// Interface names on `switch` with at least one learned MAC.
    pub fn interfaces(&self, switch: &str) -> Vec<String> {
        self.macs_by_switch
            .get(switch)
            .map(|r| r.value().keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Node declared on `switch` under exactly `label`.
    pub fn node_for_port(&self, switch: &str, label: &str) -> Option<String> {
        self.switch_ports
            .get(switch)
            .and_then(|r| r.value().get(label).cloned())
    }

    /// Declared port bindings for `switch` (empty if none).
    pub fn switch_ports(&self, switch: &str) -> Arc<PortMap> {
        self.switch_ports
            .get(switch)
            .map_or_else(|| Arc::new(PortMap::new()), |r| Arc::clone(r.value()))
    }

    /// Distinct MACs with at least one location.
    pub fn mac_count(&self) -> usize {
        self.mac_locations.len()
    }

    /// Switches that contributed at least one observation.
    pub fn switch_count(&self) -> usize {
        self.macs_by_switch.len()
    }

    pub fn last_rebuild(&self) -> Option<DateTime<Utc>> {
        *self.last_rebuild.borrow()
    }

    /// Watch the mutation counter; it changes after every write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Owned, sorted copy of the whole cache. Consistent with respect to
    /// merges; take it after a rebuild's stream is exhausted for a complete
    /// picture.
    pub fn snapshot(&self) -> TopologySnapshot {
        let _guard = self.lock();
        TopologySnapshot {
            mac_locations: self
                .mac_locations
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect(),
            macs_by_switch: self
                .macs_by_switch
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect(),
            nodes_by_mac: self
                .nodes_by_mac
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect(),
            switch_ports: self
                .switch_ports
                .iter()
                .map(|r| (r.key().clone(), PortMap::clone(r.value())))
                .collect(),
            last_rebuild: self.last_rebuild(),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, ()> {
        // Guarded data is `()`; a panicked writer leaves nothing torn.
        self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

/// Point-in-time copy of a [`TopologyCache`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologySnapshot {
    pub mac_locations: BTreeMap<MacAddress, Vec<MacLocation>>,
    pub macs_by_switch: BTreeMap<String, IndexMap<String, Vec<MacAddress>>>,
    pub nodes_by_mac: BTreeMap<MacAddress, String>,
    pub switch_ports: BTreeMap<String, PortMap>,
    pub last_rebuild: Option<DateTime<Utc>>,
}

impl TopologySnapshot {
    /// Flattened `(mac, location, node)` rows, sorted by MAC.
    pub fn rows(&self) -> impl Iterator<Item = (MacAddress, &MacLocation, Option<&str>)> {
        self.mac_locations.iter().flat_map(move |(mac, locations)| {
            let node = self.nodes_by_mac.get(mac).map(String::as_str);
            locations.iter().map(move |loc| (*mac, loc, node))
        })
    }
}
