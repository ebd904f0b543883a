//! CLI error types with miette diagnostics.
//!
//! Maps core and inventory errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use macmap_config::ConfigError;
use macmap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Access ───────────────────────────────────────────────────────
    #[error("Network topology is not available here: {message}")]
    #[diagnostic(
        code(macmap::forbidden),
        help("Only the default tenant may scan switches. Remove `tenant` from the inventory.")
    )]
    Forbidden { message: String },

    // ── Switches ─────────────────────────────────────────────────────
    #[error("Could not interrogate switch {switch}")]
    #[diagnostic(
        code(macmap::switch_failed),
        help(
            "Check that SNMP is enabled on {switch} and the community is right.\n\
             Try: macmap switch {switch} --community <COMMUNITY> -vv"
        )
    )]
    SwitchFailed {
        switch: String,
        #[source]
        source: CoreError,
    },

    #[error("Switch {switch} did not answer within {seconds}s")]
    #[diagnostic(
        code(macmap::timeout),
        help("Raise [scan] switch_timeout_secs / snmp_timeout_secs, or check reachability.")
    )]
    Timeout { switch: String, seconds: u64 },

    #[error("Switch {switch} cannot report its forwarding table")]
    #[diagnostic(
        code(macmap::unsupported),
        help("The switch must implement the Q-BRIDGE-MIB dot1qTpFdbTable.\n{detail}")
    )]
    Unsupported { switch: String, detail: String },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("No switch port found for {what}")]
    #[diagnostic(
        code(macmap::not_found),
        help("Run `macmap scan` without filters to see every learned MAC.")
    )]
    NotFound { what: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Inventory error")]
    #[diagnostic(
        code(macmap::config),
        help("Inventory file: {path}")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(macmap::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(macmap::core))]
    Core(CoreError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(macmap::output))]
    Output(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::SwitchFailed { .. } | Self::Unsupported { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Config { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Forbidden { message } => Self::Forbidden { message },
            CoreError::Timeout {
                switch,
                timeout_secs,
            } => Self::Timeout {
                switch,
                seconds: timeout_secs,
            },
            CoreError::UnsupportedCapability { switch, capability } => Self::Unsupported {
                switch,
                detail: format!("Missing: {capability}"),
            },
            CoreError::Switch { ref switch, .. }
            | CoreError::MalformedResponse { ref switch, .. }
            | CoreError::Cancelled { ref switch } => Self::SwitchFailed {
                switch: switch.clone(),
                source: err,
            },
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            other => Self::Core(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Output(err.to_string())
    }
}
