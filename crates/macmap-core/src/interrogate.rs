// ── Switch interrogation ──
//
// Walks one switch's forwarding, bridge-port, and interface-name tables and
// joins them into per-MAC observations:
//
//   MAC ─(dot1qTpFdbPort)→ bridge port ─(dot1dBasePortIfIndex)→ ifIndex
//       ─(ifName, else ifDescr)→ interface name ─(name matcher)→ node
//
// Each step is a separate walk; a failure anywhere fails only this switch.

use indexmap::IndexMap;
use macmap_snmp::oid::{
    DOT1D_BASE_PORT_IF_INDEX, DOT1D_TP_FDB_PORT, DOT1Q_TP_FDB_PORT, IF_DESCR, IF_NAME,
};
use macmap_snmp::{ObjectId, SnmpSession, VarBind};
use strum::Display;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::matcher::PortNameMatcher;
use crate::model::{MacAddress, MacObservation, SwitchReport};

/// Source of the MAC-to-bridge-port mapping, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ForwardingTable {
    /// dot1qTpFdbPort, indexed by forwarding database and MAC.
    #[strum(serialize = "Q-Bridge")]
    QBridge,
    /// dot1dTpFdbPort. Needs per-VLAN community/context iteration on most
    /// switches that lack Q-Bridge; not implemented yet.
    #[strum(serialize = "Bridge-MIB")]
    BridgeMib,
}

impl ForwardingTable {
    pub const PREFERENCE: [Self; 2] = [Self::QBridge, Self::BridgeMib];

    pub fn root(self) -> ObjectId {
        match self {
            Self::QBridge => ObjectId::from(DOT1Q_TP_FDB_PORT),
            Self::BridgeMib => ObjectId::from(DOT1D_TP_FDB_PORT),
        }
    }

    /// Learn `MAC → bridge port`. `Ok(None)` means the table is absent on
    /// this switch and the next strategy should be tried.
    async fn learn<S: SnmpSession>(
        self,
        session: &mut S,
        switch: &str,
    ) -> Result<Option<IndexMap<MacAddress, u64>>, CoreError> {
        match self {
            Self::QBridge => {
                let root = self.root();
                let rows = walk(session, switch, &root).await?;
                if rows.is_empty() {
                    return Ok(None);
                }
                parse_forwarding_rows(switch, &root, &rows).map(Some)
            }
            Self::BridgeMib => Err(CoreError::UnsupportedCapability {
                switch: switch.to_owned(),
                capability: "the Q-Bridge forwarding table (Bridge-MIB fallback is not implemented)"
                    .into(),
            }),
        }
    }
}

/// Interrogate one switch over an open session.
///
/// `ports` maps this switch's declared port labels to node names, in
/// declaration order; the first label that matches a MAC's interface wins.
/// A MAC whose bridge port has no ifIndex, or whose ifIndex has no name, is
/// skipped rather than failing the whole switch.
pub async fn interrogate<S: SnmpSession>(
    session: &mut S,
    switch: &str,
    ports: &IndexMap<String, String>,
    matcher: &PortNameMatcher,
) -> Result<SwitchReport, CoreError> {
    let forwarding = learn_forwarding(session, switch).await?;

    let bridge_root = ObjectId::from(DOT1D_BASE_PORT_IF_INDEX);
    let bridge_rows = walk(session, switch, &bridge_root).await?;
    let bridge_to_if = parse_index_rows(switch, &bridge_root, &bridge_rows)?;
    debug!(switch, bridge_ports = bridge_to_if.len(), "bridge port map walked");

    let names = interface_names(session, switch).await?;

    let mut resolved = Vec::with_capacity(forwarding.len());
    for (mac, bridge_port) in &forwarding {
        let name = bridge_to_if
            .get(bridge_port)
            .and_then(|if_index| names.get(if_index));
        match name {
            Some(name) => resolved.push((*mac, name.clone())),
            None => trace!(switch, %mac, bridge_port, "MAC not resolvable to an interface"),
        }
    }

    let mut report = SwitchReport::new(switch);
    for (_, interface) in &resolved {
        *report.ambiguity.entry(interface.clone()).or_insert(0) += 1;
    }
    for (mac, interface) in resolved {
        let ambiguity = report.ambiguity.get(&interface).copied().unwrap_or(1);
        let node = node_lookup(ports, matcher, &interface).map(str::to_owned);
        report.observations.push(MacObservation {
            mac,
            interface,
            ambiguity,
            node,
        });
    }

    debug!(
        switch,
        macs = report.mac_count(),
        interfaces = report.ambiguity.len(),
        "switch interrogated"
    );
    Ok(report)
}

/// Find the node bound to `interface` among a switch's declared port labels.
pub fn node_lookup<'a>(
    ports: &'a IndexMap<String, String>,
    matcher: &PortNameMatcher,
    interface: &str,
) -> Option<&'a str> {
    ports
        .iter()
        .find(|(label, _)| matcher.matches(interface, label))
        .map(|(_, node)| node.as_str())
}

async fn learn_forwarding<S: SnmpSession>(
    session: &mut S,
    switch: &str,
) -> Result<IndexMap<MacAddress, u64>, CoreError> {
    for table in ForwardingTable::PREFERENCE {
        if let Some(map) = table.learn(session, switch).await? {
            debug!(switch, %table, macs = map.len(), "forwarding table walked");
            return Ok(map);
        }
        debug!(switch, %table, "forwarding table absent, trying next strategy");
    }
    Err(CoreError::UnsupportedCapability {
        switch: switch.to_owned(),
        capability: "any known forwarding table".into(),
    })
}

/// ifName, or ifDescr when the switch reports no non-empty ifName at all.
async fn interface_names<S: SnmpSession>(
    session: &mut S,
    switch: &str,
) -> Result<IndexMap<u64, String>, CoreError> {
    let name_root = ObjectId::from(IF_NAME);
    let rows = walk(session, switch, &name_root).await?;
    let mut names = IndexMap::new();
    for row in &rows {
        let Some(name) = row.value.as_text().filter(|n| !n.is_empty()) else {
            continue;
        };
        names.insert(row_index(switch, &name_root, row)?, name);
    }
    if !names.is_empty() {
        return Ok(names);
    }

    debug!(switch, "ifName empty, falling back to ifDescr");
    let descr_root = ObjectId::from(IF_DESCR);
    let rows = walk(session, switch, &descr_root).await?;
    for row in &rows {
        let descr = row.value.as_text().unwrap_or_default();
        names.insert(row_index(switch, &descr_root, row)?, descr);
    }
    Ok(names)
}

async fn walk<S: SnmpSession>(
    session: &mut S,
    switch: &str,
    root: &ObjectId,
) -> Result<Vec<VarBind>, CoreError> {
    session
        .walk(root)
        .await
        .map_err(|e| CoreError::switch(switch, e))
}

/// `MAC → bridge port` from forwarding-table rows. Rows with port 0 (no
/// port, or learned on the CPU) are skipped; later rows for the same MAC in
/// another forwarding database replace earlier ones.
fn parse_forwarding_rows(
    switch: &str,
    root: &ObjectId,
    rows: &[VarBind],
) -> Result<IndexMap<MacAddress, u64>, CoreError> {
    let mut map = IndexMap::new();
    for row in rows {
        let port = row
            .value
            .as_u64()
            .ok_or_else(|| malformed(switch, row, "bridge port is not an integer"))?;
        if port == 0 {
            continue;
        }
        let mac = row
            .oid
            .suffix(root)
            .and_then(MacAddress::from_oid_suffix)
            .ok_or_else(|| malformed(switch, row, "index does not end in a MAC address"))?;
        map.insert(mac, port);
    }
    Ok(map)
}

/// `last index arc → integer value`, for bridge-port and similar tables.
fn parse_index_rows(
    switch: &str,
    root: &ObjectId,
    rows: &[VarBind],
) -> Result<IndexMap<u64, u64>, CoreError> {
    rows.iter()
        .map(|row| {
            let key = row_index(switch, root, row)?;
            let value = row
                .value
                .as_u64()
                .ok_or_else(|| malformed(switch, row, "value is not an integer"))?;
            Ok((key, value))
        })
        .collect()
}

fn row_index(switch: &str, root: &ObjectId, row: &VarBind) -> Result<u64, CoreError> {
    row.oid
        .suffix(root)
        .and_then(<[u64]>::last)
        .copied()
        .ok_or_else(|| malformed(switch, row, "missing instance index"))
}

fn malformed(switch: &str, row: &VarBind, reason: &str) -> CoreError {
    CoreError::MalformedResponse {
        switch: switch.to_owned(),
        oid: row.oid.to_string(),
        reason: reason.to_owned(),
    }
}
