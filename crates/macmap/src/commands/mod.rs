//! Command handlers.

pub mod scan;
pub mod switch;

use std::path::PathBuf;

use macmap_config::Inventory;
use macmap_core::{MacAddress, MacLocation};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Shared MAC table ────────────────────────────────────────────────

/// One learned MAC at one switch port.
#[derive(Debug, Clone, Serialize)]
pub struct MacEntry {
    pub mac: MacAddress,
    pub switch: String,
    pub interface: String,
    /// Distinct MACs on the same interface.
    pub macs_on_port: usize,
    pub node: Option<String>,
}

impl MacEntry {
    pub fn new(mac: MacAddress, location: &MacLocation, node: Option<&str>) -> Self {
        Self {
            mac,
            switch: location.switch.clone(),
            interface: location.interface.clone(),
            macs_on_port: location.ambiguity,
            node: node.map(str::to_owned),
        }
    }

    pub fn plain(&self) -> String {
        format!(
            "{} {} {} {}",
            self.mac,
            self.switch,
            self.interface,
            self.node.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Tabled)]
pub struct MacRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Switch")]
    switch: String,
    #[tabled(rename = "Port")]
    interface: String,
    #[tabled(rename = "MACs on port")]
    macs_on_port: String,
    #[tabled(rename = "Node")]
    node: String,
}

impl From<&MacEntry> for MacRow {
    fn from(e: &MacEntry) -> Self {
        Self {
            mac: e.mac.to_string(),
            switch: e.switch.clone(),
            interface: e.interface.clone(),
            macs_on_port: if e.macs_on_port > 1 {
                format!("{} (shared)", e.macs_on_port)
            } else {
                e.macs_on_port.to_string()
            },
            node: e.node.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

// ── Inventory ───────────────────────────────────────────────────────

fn inventory_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(macmap_config::config_path)
}

/// Load the inventory named by `--config` (or the default location).
pub fn load_inventory(global: &GlobalOpts) -> Result<Inventory, CliError> {
    let path = inventory_path(global);
    tracing::debug!(path = %path.display(), "loading inventory");
    Inventory::load(&path).map_err(|source| CliError::Config {
        path: path.display().to_string(),
        source,
    })
}

/// Build a `CliError::Config` for errors found after loading.
pub fn inventory_error(global: &GlobalOpts, source: macmap_config::ConfigError) -> CliError {
    CliError::Config {
        path: inventory_path(global).display().to_string(),
        source,
    }
}
