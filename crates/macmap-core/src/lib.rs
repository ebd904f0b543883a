//! MAC-to-switchport discovery engine and topology cache.
//!
//! Answers "which configured node is attached to MAC X" and "which MACs are
//! attached to node Y" by interrogating a fleet of managed switches over
//! SNMP and reconciling what they report with operator-declared port
//! bindings:
//!
//! - **[`Scanner`]**: builds the switch worklist from a [`ConfigSource`],
//!   interrogates switches under bounded concurrency with a per-switch
//!   deadline, merges each result as it lands, and streams one
//!   [`SwitchCompletion`] per switch ([`ScanStream`]). A failing switch
//!   never aborts the scan; only a tenant-scoped caller is refused.
//!
//! - **[`TopologyCache`]**: the shared result. `DashMap`-backed for
//!   lock-free point lookups during a rebuild, with merges serialized and
//!   a `tokio::sync::watch` version counter for change notification.
//!
//! - **[`interrogate()`]**: the per-switch Q-Bridge / bridge-port / ifName
//!   walk and join, producing a [`SwitchReport`] with ambiguity counts.
//!
//! - **[`PortNameMatcher`]**: data-driven reconciliation of declared port
//!   labels against switch interface names (vendor whitelist and
//!   aggregate/virtual-interface blacklist).

pub mod config;
pub mod error;
pub mod interrogate;
pub mod matcher;
pub mod model;
pub mod scanner;
pub mod source;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ScanConfig;
pub use error::CoreError;
pub use interrogate::{ForwardingTable, interrogate, node_lookup};
pub use matcher::{NameRule, PortNameMatcher, RuleKind, names_match};
pub use scanner::{ScanStream, Scanner};
pub use source::{ConfigSource, MemoryConfigSource, NodeAttributes};
pub use store::{PortMap, TopologyCache, TopologySnapshot, TopologyWarning};

pub use model::{
    MacAddress, MacLocation, MacObservation, ParseMacError, SwitchCompletion, SwitchReport,
    SwitchTarget,
};
