use thiserror::Error;

/// Top-level error type for the `macmap-snmp` crate.
///
/// Covers every failure mode of a walk: socket setup, per-request timeouts,
/// agent protocol errors, and misbehaving agents that never leave a subtree.
/// `macmap-core` wraps these into per-switch failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Socket creation or address resolution failed.
    #[error("SNMP transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A single request went unanswered.
    #[error("SNMP request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Protocol ────────────────────────────────────────────────────
    /// The agent answered with an error status or an undecodable PDU.
    #[error("SNMP protocol error: {0}")]
    Protocol(String),

    /// An object identifier could not be parsed or encoded.
    #[error("Invalid object identifier: {0}")]
    InvalidOid(String),

    /// GETNEXT returned an OID that does not sort after the previous one.
    #[error("Agent returned non-increasing OID {next} after {previous}")]
    NonIncreasing { previous: String, next: String },

    /// The walk exceeded the configured row cap.
    #[error("Walk of {root} exceeded {limit} rows")]
    TooManyRows { root: String, limit: usize },
}

impl Error {
    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout { .. })
    }
}
