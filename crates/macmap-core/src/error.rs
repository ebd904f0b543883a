// ── Core error types ──
//
// User-facing errors from macmap-core. Consumers never see raw SNMP
// transport errors for a rebuild: per-switch failures are logged and
// isolated, and only the tenant gate fails a whole scan. The
// `CoreError::switch` constructor translates transport errors into
// domain-appropriate variants for single-switch callers.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Access ───────────────────────────────────────────────────────
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // ── Per-switch failures ──────────────────────────────────────────
    #[error("Switch {switch} does not support {capability}")]
    UnsupportedCapability { switch: String, capability: String },

    #[error("Interrogation of switch {switch} failed: {source}")]
    Switch {
        switch: String,
        #[source]
        source: macmap_snmp::Error,
    },

    #[error("Interrogation of switch {switch} timed out after {timeout_secs}s")]
    Timeout { switch: String, timeout_secs: u64 },

    #[error("Malformed response from switch {switch} at {oid}: {reason}")]
    MalformedResponse {
        switch: String,
        oid: String,
        reason: String,
    },

    #[error("Interrogation of switch {switch} was cancelled")]
    Cancelled { switch: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a transport error raised while talking to `switch`.
    pub fn switch(switch: impl Into<String>, source: macmap_snmp::Error) -> Self {
        let switch = switch.into();
        match source {
            macmap_snmp::Error::Timeout { timeout_secs } => Self::Timeout {
                switch,
                timeout_secs,
            },
            other => Self::Switch {
                switch,
                source: other,
            },
        }
    }

    /// Whether this failure is local to one switch (the scan carries on).
    pub fn is_switch_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCapability { .. }
                | Self::Switch { .. }
                | Self::Timeout { .. }
                | Self::MalformedResponse { .. }
                | Self::Cancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_timeouts_become_switch_timeouts() {
        let err = CoreError::switch("sw1", macmap_snmp::Error::Timeout { timeout_secs: 5 });
        assert!(matches!(err, CoreError::Timeout { ref switch, timeout_secs: 5 } if switch == "sw1"));
        assert!(err.is_switch_local());
    }

    #[test]
    fn other_transport_errors_keep_their_source() {
        let err = CoreError::switch("sw1", macmap_snmp::Error::Protocol("noSuchName".into()));
        assert_eq!(
            err.to_string(),
            "Interrogation of switch sw1 failed: SNMP protocol error: noSuchName"
        );
    }

    #[test]
    fn forbidden_is_not_switch_local() {
        let err = CoreError::Forbidden {
            message: "tenant".into(),
        };
        assert!(!err.is_switch_local());
    }
}
