//! Switch inventory for macmap.
//!
//! One TOML file (plus `MACMAP_*` environment overrides) declares which
//! node is cabled to which switch port, the credentials for each switch,
//! scan tuning, and extra port-name rules. [`Inventory`] implements
//! [`macmap_core::ConfigSource`] so a scanner can rebuild straight from it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use macmap_core::source::{ATTR_SWITCH, ATTR_SWITCH_PASSWORD, ATTR_SWITCH_USER, ATTR_SWITCHPORT};
use macmap_core::{ConfigSource, CoreError, NameRule, NodeAttributes, PortNameMatcher, ScanConfig};
use macmap_snmp::{Credentials, TransportConfig};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("inventory loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

// ── TOML inventory structs ──────────────────────────────────────────

/// Top-level inventory file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Inventory {
    /// Tenant scope of this inventory; unset for the default tenant.
    pub tenant: Option<String>,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub matcher: MatcherSettings,

    /// Node name → where it is cabled.
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeEntry>,

    /// Switch address → how to talk to it.
    #[serde(default)]
    pub switches: BTreeMap<String, SwitchEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScanSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline for one switch's whole interrogation.
    #[serde(default = "default_switch_timeout")]
    pub switch_timeout_secs: u64,

    /// Deadline for a single SNMP request.
    #[serde(default = "default_snmp_timeout")]
    pub snmp_timeout_secs: u64,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            switch_timeout_secs: default_switch_timeout(),
            snmp_timeout_secs: default_snmp_timeout(),
            port: default_port(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_concurrency() -> usize {
    ScanConfig::default().concurrency
}
fn default_switch_timeout() -> u64 {
    ScanConfig::default().switch_timeout.as_secs()
}
fn default_snmp_timeout() -> u64 {
    TransportConfig::default().timeout.as_secs()
}
fn default_port() -> u16 {
    TransportConfig::default().port
}
fn default_max_rows() -> usize {
    TransportConfig::default().max_rows
}

/// Site-specific port-name rules, added after the built-in ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatcherSettings {
    /// Vendor label → regex whose first capture group is the port number.
    #[serde(default)]
    pub port_patterns: BTreeMap<String, String>,

    /// Interface names matching any of these never bind by suffix.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeEntry {
    pub switch: Option<String>,
    pub switchport: Option<PortLabel>,
}

/// A declared port, written either as a name (`"Gi1/0/3"`) or a bare
/// number (`3`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PortLabel {
    Number(u64),
    Name(String),
}

impl fmt::Display for PortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SwitchEntry {
    /// SNMPv3 user. Ignored unless a password resolves.
    pub user: Option<String>,

    /// Community or v3 passphrase (plaintext; prefer `password_env`).
    #[serde(skip_serializing)]
    pub password: Option<SecretString>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,
}

impl SwitchEntry {
    /// `password_env` → plaintext `password` → none.
    pub fn resolve_password(&self) -> Option<SecretString> {
        if let Some(ref var) = self.password_env {
            if let Ok(value) = std::env::var(var) {
                return Some(SecretString::from(value));
            }
            debug!(var, "password variable unset, trying plaintext");
        }
        self.password.clone()
    }

    /// Credentials for this switch; community `public` when no password
    /// resolves.
    pub fn credentials(&self) -> Credentials {
        self.resolve_password().map_or_else(Credentials::default, |password| {
            Credentials::new(password.expose_secret(), self.user.clone())
        })
    }
}

// ── Inventory path ──────────────────────────────────────────────────

/// Default inventory location via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "macmap", "macmap").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("macmap");
            p.push("inventory.toml");
            p
        },
        |dirs| dirs.config_dir().join("inventory.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

impl Inventory {
    /// Load from `path` (a missing file yields the defaults) with
    /// `MACMAP_*` overrides, e.g. `MACMAP_SCAN__CONCURRENCY=8`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::extract(Figment::new().merge(Toml::file(path)))
    }

    /// Load from the default [`config_path`].
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&config_path())
    }

    /// Parse an inventory held in memory (environment overrides still apply).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::new().merge(Toml::string(toml)))
    }

    fn extract(file: Figment) -> Result<Self, ConfigError> {
        let inventory: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(Env::prefixed("MACMAP_").split("__"))
            .extract()?;
        inventory.validate()?;
        Ok(inventory)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.switch_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "scan.switch_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.scan.snmp_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "scan.snmp_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        for (name, node) in &self.nodes {
            if node.switchport.is_some() && node.switch.is_none() {
                return Err(ConfigError::Validation {
                    field: format!("nodes.{name}"),
                    reason: "switchport given without switch".into(),
                });
            }
        }
        Ok(())
    }

    // ── Translation to core types ───────────────────────────────────

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            concurrency: self.scan.concurrency,
            switch_timeout: Duration::from_secs(self.scan.switch_timeout_secs),
            transport: self.transport(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            port: self.scan.port,
            timeout: Duration::from_secs(self.scan.snmp_timeout_secs),
            max_rows: self.scan.max_rows,
        }
    }

    /// Built-in port-name rules plus the `[matcher]` additions.
    pub fn matcher(&self) -> Result<PortNameMatcher, ConfigError> {
        let invalid = |field: String, err: CoreError| ConfigError::Validation {
            field,
            reason: err.to_string(),
        };

        let mut matcher = PortNameMatcher::default();
        for (label, pattern) in &self.matcher.port_patterns {
            let rule = NameRule::port_number(label.as_str(), pattern)
                .map_err(|e| invalid(format!("matcher.port_patterns.{label}"), e))?;
            matcher = matcher.with_rule(rule);
        }
        for (i, pattern) in self.matcher.exclude_patterns.iter().enumerate() {
            let rule = NameRule::exclude(pattern.as_str(), pattern)
                .map_err(|e| invalid(format!("matcher.exclude_patterns[{i}]"), e))?;
            matcher = matcher.with_rule(rule);
        }
        Ok(matcher)
    }

    /// Credentials for `address`, defaulting when it is not in `[switches]`.
    pub fn credentials(&self, address: &str) -> Credentials {
        self.switches
            .get(address)
            .map_or_else(Credentials::default, SwitchEntry::credentials)
    }
}

// ── Configuration source ────────────────────────────────────────────

impl ConfigSource for Inventory {
    fn tenant(&self) -> Option<String> {
        self.tenant.clone().filter(|t| !t.is_empty())
    }

    fn list_nodes(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.nodes.keys().cloned().collect())
    }

    fn node_attributes(
        &self,
        nodes: &[String],
        attrs: &[&str],
        decrypt: bool,
    ) -> Result<NodeAttributes, CoreError> {
        let wanted = |attr: &str| attrs.contains(&attr);

        Ok(nodes
            .iter()
            .map(|name| {
                let mut values = HashMap::new();
                if let Some(node) = self.nodes.get(name) {
                    if let (true, Some(switch)) = (wanted(ATTR_SWITCH), &node.switch) {
                        values.insert(ATTR_SWITCH.to_owned(), switch.clone());
                    }
                    if let (true, Some(port)) = (wanted(ATTR_SWITCHPORT), &node.switchport) {
                        values.insert(ATTR_SWITCHPORT.to_owned(), port.to_string());
                    }
                }
                // Secrets are only ever handed out decrypted.
                if let (true, Some(entry)) = (decrypt, self.switches.get(name)) {
                    if let (true, Some(password)) =
                        (wanted(ATTR_SWITCH_PASSWORD), entry.resolve_password())
                    {
                        values.insert(
                            ATTR_SWITCH_PASSWORD.to_owned(),
                            password.expose_secret().to_owned(),
                        );
                    }
                    if let (true, Some(user)) = (wanted(ATTR_SWITCH_USER), &entry.user) {
                        values.insert(ATTR_SWITCH_USER.to_owned(), user.clone());
                    }
                }
                (name.clone(), values)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_inventory_uses_core_defaults() {
        let inventory = Inventory::default();
        assert_eq!(inventory.scan_config(), ScanConfig::default());
        assert_eq!(inventory.tenant(), None);
    }

    #[test]
    fn numeric_and_named_ports_render_as_labels() {
        assert_eq!(PortLabel::Number(3).to_string(), "3");
        assert_eq!(PortLabel::Name("Gi1/0/3".into()).to_string(), "Gi1/0/3");
    }

    #[test]
    fn password_env_beats_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MACMAP_TEST_SW1_PASSWORD", "from-env");
            let entry = SwitchEntry {
                user: Some("admin".into()),
                password: Some(SecretString::from("plain")),
                password_env: Some("MACMAP_TEST_SW1_PASSWORD".into()),
            };
            assert_eq!(entry.resolve_password().unwrap().expose_secret(), "from-env");

            let fallback = SwitchEntry {
                password_env: Some("MACMAP_TEST_UNSET".into()),
                ..entry
            };
            assert_eq!(fallback.resolve_password().unwrap().expose_secret(), "plain");
            Ok(())
        });
    }

    #[test]
    fn user_without_password_falls_back_to_public() {
        let entry = SwitchEntry {
            user: Some("admin".into()),
            ..SwitchEntry::default()
        };
        let credentials = entry.credentials();
        assert_eq!(credentials.community.expose_secret(), "public");
        assert_eq!(credentials.user, None);
    }

    #[test]
    fn bad_matcher_pattern_names_the_field() {
        let mut inventory = Inventory::default();
        inventory
            .matcher
            .port_patterns
            .insert("acme".into(), "^port-\\d+$".into());
        let err = inventory.matcher().unwrap_err();
        assert!(
            err.to_string().contains("matcher.port_patterns.acme"),
            "got {err}"
        );
    }
}
