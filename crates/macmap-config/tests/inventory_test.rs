//! Inventory files on disk driving real configuration-source lookups.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::sync::Arc;

use futures_util::StreamExt;
use macmap_config::{ConfigError, Inventory, PortLabel};
use macmap_core::source::{ATTR_SWITCH, ATTR_SWITCH_PASSWORD, ATTR_SWITCH_USER, ATTR_SWITCHPORT};
use macmap_core::{ConfigSource, CoreError, Scanner, TopologyCache};
use macmap_snmp::oid::{DOT1D_BASE_PORT_IF_INDEX, DOT1Q_TP_FDB_PORT, IF_NAME};
use macmap_snmp::{MemoryAgent, MemoryFactory, SnmpValue};
use pretty_assertions::assert_eq;

const INVENTORY: &str = r#"
[scan]
concurrency = 8
switch_timeout_secs = 30

[matcher]
exclude_patterns = ["^mgmt"]

[matcher.port_patterns]
acme = '^acme port (\d+) slot \d+$'

[nodes.n1]
switch = "sw1"
switchport = 3

[nodes.n2]
switch = "sw1"
switchport = "Gi1/0/4"

[nodes.n3]
switch = "sw2"

[switches.sw1]
user = "admin"
password = "s3cret"
"#;

fn write_inventory(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_nodes_switches_and_tuning() {
    let file = write_inventory(INVENTORY);
    let inventory = Inventory::load(file.path()).unwrap();

    assert_eq!(inventory.scan.concurrency, 8);
    assert_eq!(inventory.scan_config().switch_timeout.as_secs(), 30);
    assert_eq!(inventory.scan.port, 161);
    assert_eq!(inventory.nodes["n1"].switchport, Some(PortLabel::Number(3)));
    assert_eq!(inventory.list_nodes().unwrap(), vec!["n1", "n2", "n3"]);

    let matcher = inventory.matcher().unwrap();
    assert!(matcher.matches("acme port 7 slot 2", "7"));
    assert!(!matcher.matches("mgmt0/1", "1"));
}

#[test]
fn exposes_node_and_secret_attributes() {
    let inventory = Inventory::from_toml_str(INVENTORY).unwrap();
    let names = ["n1".to_owned(), "sw1".to_owned()];

    let plain = inventory
        .node_attributes(&names, &[ATTR_SWITCH, ATTR_SWITCHPORT, ATTR_SWITCH_PASSWORD], false)
        .unwrap();
    assert_eq!(plain["n1"][ATTR_SWITCHPORT], "3");
    assert!(plain["sw1"].is_empty());

    let secret = inventory
        .node_attributes(&names, &[ATTR_SWITCH_USER, ATTR_SWITCH_PASSWORD], true)
        .unwrap();
    assert_eq!(secret["sw1"][ATTR_SWITCH_PASSWORD], "s3cret");
    assert_eq!(secret["sw1"][ATTR_SWITCH_USER], "admin");
    assert!(inventory.credentials("sw1").is_v3());
    assert!(!inventory.credentials("sw9").is_v3());
}

#[test]
fn missing_file_is_an_empty_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = Inventory::load(&dir.path().join("absent.toml")).unwrap();
    assert!(inventory.nodes.is_empty());
}

#[test]
fn zero_timeout_is_rejected() {
    let err = Inventory::from_toml_str("[scan]\nswitch_timeout_secs = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }), "got {err:?}");
}

#[test]
fn port_without_switch_is_rejected() {
    let err = Inventory::from_toml_str("[nodes.n1]\nswitchport = 3\n").unwrap_err();
    assert!(err.to_string().contains("nodes.n1"), "got {err}");
}

#[tokio::test]
async fn tenant_inventory_cannot_rebuild() {
    let inventory = Inventory::from_toml_str("tenant = \"acme\"\n").unwrap();
    let scanner = Scanner::new(
        MemoryFactory::default(),
        Arc::new(TopologyCache::new()),
        inventory.scan_config(),
    );
    assert!(matches!(
        scanner.rebuild(&inventory),
        Err(CoreError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn rebuild_from_inventory_file() {
    let agent = MemoryAgent::new()
        .with(DOT1Q_TP_FDB_PORT, &[1, 0, 0x1b, 0x21, 0, 0, 1], SnmpValue::Integer(3))
        .with(DOT1Q_TP_FDB_PORT, &[1, 0, 0x1b, 0x21, 0, 0, 2], SnmpValue::Integer(4))
        .with(DOT1D_BASE_PORT_IF_INDEX, &[3], SnmpValue::Integer(10103))
        .with(DOT1D_BASE_PORT_IF_INDEX, &[4], SnmpValue::Integer(10104))
        .with(IF_NAME, &[10103], SnmpValue::OctetString(b"Gi1/0/3".to_vec()))
        .with(IF_NAME, &[10104], SnmpValue::OctetString(b"Gi1/0/4".to_vec()));
    let factory = MemoryFactory::new([("sw1".to_owned(), agent)]);

    let file = write_inventory(INVENTORY);
    let inventory = Inventory::load(file.path()).unwrap();
    let scanner = Scanner::new(factory, Arc::new(TopologyCache::new()), inventory.scan_config())
        .with_matcher(inventory.matcher().unwrap());

    let completions: Vec<_> = scanner.rebuild(&inventory).unwrap().collect().await;
    assert_eq!(completions.len(), 2);

    let cache = scanner.cache();
    assert_eq!(
        cache.node_for_mac(&"00:1b:21:00:00:01".parse().unwrap()).as_deref(),
        Some("n1")
    );
    assert_eq!(
        cache.node_for_mac(&"00:1b:21:00:00:02".parse().unwrap()).as_deref(),
        Some("n2")
    );
}
