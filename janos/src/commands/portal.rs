use anyhow::{Result, bail};
use comfy_table::Cell;
use janos_core::portal;
use janos_core::state::HtmlFile;
use janos_core::{Feature, SessionManager};
use std::time::Duration;

use crate::commands::{live, scan as scan_cmd};
use crate::output::{OutputFormat, create_table, print_output, truncate};
use crate::utils::{print_info, print_success, print_warning};

/// List the SD card templates and activate `html`
async fn prepare_html(
    session: &mut SessionManager,
    html: &str,
    format: OutputFormat,
) -> Result<HtmlFile> {
    let files = portal::list_html_files(session).await?;
    if files.is_empty() {
        bail!("No HTML files found on SD card. Make sure the card is inserted");
    }

    let Some(file) = files.iter().find(|file| file.number == html.trim()).cloned() else {
        if format == OutputFormat::Table {
            print_html_files(&files);
        }
        bail!("HTML file number {} not found", html.trim());
    };

    let confirmations = portal::select_html(session, &files, html).await?;
    if format == OutputFormat::Table {
        for line in &confirmations {
            print_success(line);
        }
        print_info(&format!("Using HTML file {}", file.name));
    }
    Ok(file)
}

fn print_html_files(files: &[HtmlFile]) {
    let mut table = create_table();
    table.set_header(vec![Cell::new("#"), Cell::new("File")]);
    for file in files {
        table.add_row(vec![Cell::new(&file.number), Cell::new(truncate(&file.name, 58))]);
    }
    println!("{table}");
}

pub async fn handle_portal(
    session: &mut SessionManager,
    ssid: &str,
    html: &str,
    duration: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    prepare_html(session, html, format).await?;

    let report = portal::start_portal(session, ssid).await?;
    match format {
        OutputFormat::Json => print_output(&report.acknowledgement, format),
        OutputFormat::Table => {
            if let Some(line) = &report.acknowledgement {
                print_success(line);
            }
        }
    }

    live::run_until_stopped(session, Feature::Portal, duration, format).await
}

pub async fn handle_evil_twin(
    session: &mut SessionManager,
    target: &str,
    html: &str,
    duration: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    let outcome = scan_cmd::run_scan(session, format).await?;
    if format == OutputFormat::Table {
        scan_cmd::print_networks(&outcome.networks);
    }

    prepare_html(session, html, format).await?;

    let (network, report) = portal::start_evil_twin(session, target).await?;
    match format {
        OutputFormat::Json => print_output(&network, format),
        OutputFormat::Table => {
            print_success(&format!(
                "Evil twin of {} on channel {}",
                network.ssid, network.channel
            ));
            if let Some(line) = &report.acknowledgement {
                print_info(line);
            }
        }
    }

    live::run_until_stopped(session, Feature::EvilTwin, duration, format).await
}

pub async fn handle_passwords(session: &mut SessionManager, format: OutputFormat) -> Result<()> {
    let log = portal::show_passwords(session).await?;

    match format {
        OutputFormat::Json => print_output(&log, format),
        OutputFormat::Table => {
            if log.entries.is_empty() {
                print_warning("No passwords captured yet");
            } else {
                let mut table = create_table();
                table.set_header(vec![
                    Cell::new("Time"),
                    Cell::new("SSID"),
                    Cell::new("Data"),
                ]);
                for entry in &log.entries {
                    table.add_row(vec![
                        Cell::new(&entry.timestamp),
                        Cell::new(truncate(&entry.ssid, 20)),
                        Cell::new(truncate(&entry.data, 25)),
                    ]);
                }
                println!("{table}");
            }
            for line in &log.other_lines {
                println!("  {line}");
            }
        }
    }

    Ok(())
}
