//! `macmap switch`: interrogate one switch and print what it learned.

use std::sync::Arc;

use macmap_core::{MacLocation, Scanner, SwitchTarget, TopologyCache};
use macmap_snmp::{Credentials, Snmp2Factory};

use super::{MacEntry, MacRow, inventory_error, load_inventory};
use crate::cli::{GlobalOpts, SwitchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: SwitchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let inventory = load_inventory(global)?;
    let config = inventory.scan_config();
    let matcher = inventory.matcher().map_err(|e| inventory_error(global, e))?;

    // Flags win over the inventory entry; a user alone is not enough for v3.
    let credentials = match args.community {
        Some(community) => Credentials::new(community, args.user),
        None => inventory.credentials(&args.address),
    };
    let target = SwitchTarget::new(args.address, credentials);

    let factory = Snmp2Factory::new(config.transport.clone());
    let cache = Arc::new(TopologyCache::new());
    cache.set_switch_ports(declared_ports(&inventory, &target.address));
    let scanner = Scanner::new(factory, cache, config).with_matcher(matcher);

    let report = scanner.interrogate_switch(&inventory, &target).await?;
    tracing::info!(
        switch = %target.address,
        macs = report.mac_count(),
        interfaces = report.ambiguity.len(),
        "switch interrogated"
    );

    let entries: Vec<MacEntry> = report
        .observations
        .iter()
        .map(|obs| {
            let location = MacLocation {
                switch: report.switch.clone(),
                interface: obs.interface.clone(),
                ambiguity: obs.ambiguity,
            };
            MacEntry::new(obs.mac, &location, obs.node.as_deref())
        })
        .collect();

    let rendered = output::render_list(
        global.output,
        &entries,
        |e| MacRow::from(e),
        MacEntry::plain,
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Port bindings the inventory declares for `address`, so nodes resolve
/// without a full rebuild.
fn declared_ports(
    inventory: &macmap_config::Inventory,
    address: &str,
) -> Option<(String, macmap_core::PortMap)> {
    let ports: macmap_core::PortMap = inventory
        .nodes
        .iter()
        .filter(|(_, node)| node.switch.as_deref() == Some(address))
        .filter_map(|(name, node)| Some((node.switchport.as_ref()?.to_string(), name.clone())))
        .collect();
    (!ports.is_empty()).then(|| (address.to_owned(), ports))
}
