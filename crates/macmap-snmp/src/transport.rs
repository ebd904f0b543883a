// Shared transport configuration for opening SNMP sessions.
//
// Every session opened by a factory shares the port, per-request timeout,
// and walk row cap set here.

use std::time::Duration;

/// Shared transport configuration for SNMP sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// UDP port of the agent.
    pub port: u16,
    /// Deadline for a single request/response exchange.
    pub timeout: Duration,
    /// Upper bound on rows returned by one walk.
    pub max_rows: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 161,
            timeout: Duration::from_secs(5),
            max_rows: 100_000,
        }
    }
}

impl TransportConfig {
    /// `host:port` socket string for an agent address.
    ///
    /// Addresses that already carry a port (or are bracketed IPv6 with one)
    /// are passed through untouched; bare IPv6 literals get bracketed.
    pub fn agent_addr(&self, address: &str) -> String {
        if address.starts_with('[') {
            if address.contains("]:") {
                return address.to_owned();
            }
            return format!("{address}:{}", self.port);
        }
        match address.matches(':').count() {
            0 => format!("{address}:{}", self.port),
            1 => address.to_owned(),
            _ => format!("[{address}]:{}", self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_addr_appends_default_port() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.agent_addr("sw1.example.net"), "sw1.example.net:161");
        assert_eq!(cfg.agent_addr("10.0.0.2:1161"), "10.0.0.2:1161");
        assert_eq!(cfg.agent_addr("fe80::1"), "[fe80::1]:161");
        assert_eq!(cfg.agent_addr("[fe80::1]"), "[fe80::1]:161");
        assert_eq!(cfg.agent_addr("[fe80::1]:1161"), "[fe80::1]:1161");
    }
}
