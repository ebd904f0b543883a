//! `macmap scan`: full rebuild with live progress.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use macmap_core::{MacAddress, MacLocation, Scanner, TopologyCache, TopologySnapshot};
use macmap_snmp::Snmp2Factory;
use tracing::{info, warn};

use super::{MacEntry, MacRow, inventory_error, load_inventory};
use crate::cli::{GlobalOpts, ScanArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ScanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let inventory = load_inventory(global)?;

    let mut config = inventory.scan_config();
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(secs) = args.switch_timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "--switch-timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        config.switch_timeout = Duration::from_secs(secs);
    }
    let matcher = inventory.matcher().map_err(|e| inventory_error(global, e))?;

    let factory = Snmp2Factory::new(config.transport.clone());
    let scanner = Scanner::new(factory, Arc::new(TopologyCache::new()), config)
        .with_matcher(matcher);

    let mut stream = scanner.rebuild(&inventory)?;
    let progress = progress_bar(stream.switches(), global.quiet);

    // Ctrl-C cancels outstanding switches; what already merged is kept.
    let canceller = scanner.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling outstanding switches");
            canceller.cancel();
        }
    });

    let mut failed = 0usize;
    while let Some(done) = stream.next().await {
        if done.macs == 0 {
            failed += 1;
        }
        progress.set_message(done.switch);
        progress.inc(1);
    }
    interrupt.abort();
    progress.finish_and_clear();

    let snapshot = scanner.cache().snapshot();
    info!(
        switches = stream.switches(),
        empty = failed,
        macs = snapshot.mac_locations.len(),
        "scan complete"
    );

    let entries = select(&snapshot, &args)?;
    let rendered = output::render_list(
        global.output,
        &entries,
        |e| MacRow::from(e),
        MacEntry::plain,
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn progress_bar(switches: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(switches).unwrap_or(u64::MAX));
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
    {
        bar.set_style(style);
    }
    bar
}

/// Everything, or just the rows for the requested MACs and nodes.
fn select(snapshot: &TopologySnapshot, args: &ScanArgs) -> Result<Vec<MacEntry>, CliError> {
    if args.macs.is_empty() && args.nodes.is_empty() {
        return Ok(snapshot.rows().map(to_entry).collect());
    }

    let entries: Vec<MacEntry> = snapshot
        .rows()
        .filter(|(mac, _, node)| {
            args.macs.contains(mac)
                || node.is_some_and(|n| args.nodes.iter().any(|wanted| wanted == n))
        })
        .map(to_entry)
        .collect();

    if entries.is_empty() {
        let what = args
            .macs
            .iter()
            .map(ToString::to_string)
            .chain(args.nodes.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CliError::NotFound { what });
    }
    Ok(entries)
}

fn to_entry((mac, location, node): (MacAddress, &MacLocation, Option<&str>)) -> MacEntry {
    MacEntry::new(mac, location, node)
}
