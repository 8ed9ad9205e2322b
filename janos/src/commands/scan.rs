use anyhow::Result;
use comfy_table::Cell;
use indicatif::{ProgressBar, ProgressStyle};
use janos_core::SessionManager;
use janos_core::scan::{self, ScanOutcome};
use janos_core::state::NetworkRecord;
use std::time::Duration;

use crate::output::{OutputFormat, create_table, print_output, rssi_cell, truncate};
use crate::utils::{print_info, print_success, print_warning};

pub async fn handle_scan(
    session: &mut SessionManager,
    select: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let outcome = run_scan(session, format).await?;

    match format {
        OutputFormat::Json => print_output(&outcome, format),
        OutputFormat::Table => print_networks(&outcome.networks),
    }

    if let Some(select) = select {
        let selection = scan::select_networks(session, &select).await?;
        if format == OutputFormat::Table {
            print_success(&format!("Selected networks: {selection}"));
        }
    }

    Ok(())
}

/// Scan with a spinner, warning when the completion marker never came
pub async fn run_scan(session: &mut SessionManager, format: OutputFormat) -> Result<ScanOutcome> {
    let spinner = if format == OutputFormat::Table {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "Scanning for networks (up to {})...",
            humantime::format_duration(session.config().scan_timeout)
        ));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    } else {
        ProgressBar::hidden()
    };

    let outcome = scan::scan_networks(session).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    if format == OutputFormat::Table {
        if !outcome.completed {
            print_warning("Scan timed out; results may be incomplete");
        }
        print_info(&format!("Found {} networks", outcome.networks.len()));
    }
    Ok(outcome)
}

pub fn print_networks(networks: &[NetworkRecord]) {
    if networks.is_empty() {
        print_info("No networks found");
        return;
    }

    let mut table = create_table();
    table.set_header(vec![
        Cell::new("#"),
        Cell::new("SSID"),
        Cell::new("Vendor"),
        Cell::new("BSSID"),
        Cell::new("CH"),
        Cell::new("Auth"),
        Cell::new("RSSI"),
        Cell::new("Band"),
    ]);

    for network in networks {
        table.add_row(vec![
            Cell::new(&network.index),
            Cell::new(truncate(&network.ssid, 24)),
            Cell::new(truncate(&network.vendor, 12)),
            Cell::new(&network.bssid),
            Cell::new(&network.channel),
            Cell::new(truncate(&network.auth, 12)),
            rssi_cell(&network.rssi, network.rssi_dbm()),
            Cell::new(&network.band),
        ]);
    }

    println!("{table}");
}
