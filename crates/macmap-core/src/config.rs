// ── Runtime scan configuration ──
//
// These types describe *how* to run a rebuild: fan-out width, per-switch
// deadline, and SNMP transport tuning. They never touch disk; the CLI (or
// any embedding service) constructs a `ScanConfig` and hands it in.

use std::time::Duration;

use macmap_snmp::TransportConfig;

/// Configuration for a [`Scanner`](crate::Scanner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum number of switches interrogated at once.
    pub concurrency: usize,
    /// Deadline for one switch's complete interrogation (all walks).
    pub switch_timeout: Duration,
    /// SNMP transport settings shared by every session.
    pub transport: TransportConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 64,
            switch_timeout: Duration::from_secs(120),
            transport: TransportConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Concurrency with a floor of one, so a zero setting cannot stall a scan.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
