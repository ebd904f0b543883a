// ── Configuration source ──
//
// What a rebuild reads from the surrounding system: the caller's tenant,
// the node list, and per-node attributes (some of them secret).

use std::collections::HashMap;

use crate::error::CoreError;

/// Switch a node is cabled to.
pub const ATTR_SWITCH: &str = "hardwaremanagement.switch";
/// Declared port label on that switch.
pub const ATTR_SWITCHPORT: &str = "hardwaremanagement.switchport";
/// SNMPv3 user for a switch entry.
pub const ATTR_SWITCH_USER: &str = "secret.hardwaremanagementuser";
/// SNMP community (v2c) or auth password (v3) for a switch entry.
pub const ATTR_SWITCH_PASSWORD: &str = "secret.hardwaremanagementpassword";

/// Node name → attribute name → value. Missing attributes are absent keys.
pub type NodeAttributes = HashMap<String, HashMap<String, String>>;

/// Read access to node inventory and switch credentials.
///
/// Switches are entries in the same namespace as nodes: their credentials
/// are read with [`node_attributes`](Self::node_attributes) keyed by switch
/// address.
pub trait ConfigSource: Send + Sync {
    /// Tenant scope of the caller; `None` is the default tenant.
    fn tenant(&self) -> Option<String>;

    fn list_nodes(&self) -> Result<Vec<String>, CoreError>;

    /// Fetch `attrs` for each of `nodes`. Secret attributes come back in
    /// clear text only when `decrypt` is set.
    fn node_attributes(
        &self,
        nodes: &[String],
        attrs: &[&str],
        decrypt: bool,
    ) -> Result<NodeAttributes, CoreError>;
}

/// Plain in-memory [`ConfigSource`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigSource {
    tenant: Option<String>,
    nodes: Vec<String>,
    attributes: NodeAttributes,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Declare `node` on `switch` port `port`.
    pub fn with_node(mut self, node: &str, switch: &str, port: &str) -> Self {
        self.nodes.push(node.to_owned());
        let attrs = self.attributes.entry(node.to_owned()).or_default();
        attrs.insert(ATTR_SWITCH.to_owned(), switch.to_owned());
        attrs.insert(ATTR_SWITCHPORT.to_owned(), port.to_owned());
        self
    }

    /// Credentials for the switch entry `switch`.
    pub fn with_switch_credentials(
        mut self,
        switch: &str,
        user: Option<&str>,
        password: &str,
    ) -> Self {
        let attrs = self.attributes.entry(switch.to_owned()).or_default();
        attrs.insert(ATTR_SWITCH_PASSWORD.to_owned(), password.to_owned());
        if let Some(user) = user {
            attrs.insert(ATTR_SWITCH_USER.to_owned(), user.to_owned());
        }
        self
    }

    /// Set one attribute on `node`, registering the node if it is new.
    pub fn with_node_attribute(mut self, node: &str, attr: &str, value: &str) -> Self {
        if !self.nodes.iter().any(|n| n == node) {
            self.nodes.push(node.to_owned());
        }
        self.set(node, attr, value);
        self
    }

    /// Set an arbitrary attribute on `entry` (a node or a switch).
    pub fn set(&mut self, entry: &str, attr: &str, value: &str) {
        self.attributes
            .entry(entry.to_owned())
            .or_default()
            .insert(attr.to_owned(), value.to_owned());
    }
}

impl ConfigSource for MemoryConfigSource {
    fn tenant(&self) -> Option<String> {
        self.tenant.clone()
    }

    fn list_nodes(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.nodes.clone())
    }

    fn node_attributes(
        &self,
        nodes: &[String],
        attrs: &[&str],
        decrypt: bool,
    ) -> Result<NodeAttributes, CoreError> {
        Ok(nodes
            .iter()
            .map(|node| {
                let values = self
                    .attributes
                    .get(node)
                    .map(|all| {
                        all.iter()
                            .filter(|(name, _)| attrs.contains(&name.as_str()))
                            .filter(|(name, _)| decrypt || !name.starts_with("secret."))
                            .map(|(name, value)| (name.clone(), value.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                (node.clone(), values)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn secrets_need_decrypt() {
        let source = MemoryConfigSource::new().with_switch_credentials("sw1", Some("admin"), "s3cret");
        let entries = ["sw1".to_owned()];
        let attrs = [ATTR_SWITCH_USER, ATTR_SWITCH_PASSWORD];

        let hidden = source.node_attributes(&entries, &attrs, false).unwrap();
        assert!(hidden["sw1"].is_empty());

        let shown = source.node_attributes(&entries, &attrs, true).unwrap();
        assert_eq!(shown["sw1"][ATTR_SWITCH_PASSWORD], "s3cret");
        assert_eq!(shown["sw1"][ATTR_SWITCH_USER], "admin");
    }

    #[test]
    fn only_requested_attributes_are_returned() {
        let source = MemoryConfigSource::new().with_node("n1", "sw1", "3");
        let attrs = source
            .node_attributes(&["n1".to_owned(), "ghost".to_owned()], &[ATTR_SWITCH], false)
            .unwrap();
        assert_eq!(attrs["n1"].len(), 1);
        assert!(attrs["ghost"].is_empty());
        assert_eq!(source.tenant(), None);
    }
}
