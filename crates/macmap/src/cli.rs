//! Clap derive structures for the `macmap` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use macmap_core::MacAddress;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// macmap -- locate MAC addresses on switch ports over SNMP
#[derive(Debug, Parser)]
#[command(
    name = "macmap",
    version,
    about = "Find which switch port every MAC address is plugged into",
    long_about = "Walks the bridge forwarding tables of every switch named in the\n\
        inventory, resolves learned MACs to interface names, and matches\n\
        them against the node-to-port bindings you declared.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Inventory file (defaults to the platform config directory)
    #[arg(long, env = "MACMAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MACMAP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interrogate every inventory switch and print the MAC table
    Scan(ScanArgs),

    /// Interrogate a single switch (no inventory bindings required)
    #[command(alias = "sw")]
    Switch(SwitchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Only report these MAC addresses (repeatable)
    #[arg(long = "mac", short = 'm', value_name = "MAC")]
    pub macs: Vec<MacAddress>,

    /// Only report MACs attached to these nodes (repeatable)
    #[arg(long = "node", short = 'n', value_name = "NODE")]
    pub nodes: Vec<String>,

    /// Switches interrogated at once (overrides the inventory)
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Per-switch deadline in seconds (overrides the inventory)
    #[arg(long)]
    pub switch_timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Switch address or hostname
    pub address: String,

    /// SNMP community (defaults to the inventory entry, then "public")
    #[arg(long, short = 'c', env = "MACMAP_COMMUNITY", hide_env_values = true)]
    pub community: Option<String>,

    /// SNMPv3 user
    #[arg(long, short = 'u')]
    pub user: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
