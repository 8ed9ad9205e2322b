use anyhow::Result;
use comfy_table::{Cell, Color};
use janos_core::state::PacketKind;
use janos_core::{Feature, SessionManager, sniffer};
use std::time::Duration;

use crate::commands::live;
use crate::output::{OutputFormat, create_table, print_output, rssi_cell, truncate};
use crate::utils::{print_info, print_success};

pub async fn handle_sniffer(
    session: &mut SessionManager,
    duration: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    let report = sniffer::start_sniffer(session).await?;
    if format == OutputFormat::Table {
        print_success(&format!("{} started", report.feature));
    }
    live::run_until_stopped(session, Feature::Sniffer, duration, format).await
}

pub async fn handle_results(session: &mut SessionManager, format: OutputFormat) -> Result<()> {
    let report = sniffer::show_results(session).await?;

    match format {
        OutputFormat::Json => print_output(&report, format),
        OutputFormat::Table => {
            if report.packets.is_empty() && report.other_lines.is_empty() {
                print_info("No sniffer results");
                return Ok(());
            }

            if !report.packets.is_empty() {
                let mut table = create_table();
                table.set_header(vec![
                    Cell::new("Type"),
                    Cell::new("Source"),
                    Cell::new("Destination"),
                    Cell::new("Size"),
                    Cell::new("Info"),
                ]);
                for packet in &report.packets {
                    table.add_row(vec![
                        Cell::new(&packet.packet_type).fg(kind_color(packet.kind)),
                        Cell::new(&packet.src),
                        Cell::new(&packet.dst),
                        Cell::new(&packet.size),
                        Cell::new(truncate(&packet.info, 40)),
                    ]);
                }
                println!("{table}");
            }

            for line in &report.other_lines {
                println!("  {line}");
            }
            print_info(&format!("{} packets", report.packets.len()));
        }
    }

    Ok(())
}

pub async fn handle_probes(session: &mut SessionManager, format: OutputFormat) -> Result<()> {
    let probes = sniffer::show_probes(session).await?;

    match format {
        OutputFormat::Json => print_output(&probes, format),
        OutputFormat::Table => {
            if probes.is_empty() {
                print_info("No probe requests captured");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec![
                Cell::new("Client MAC"),
                Cell::new("SSID"),
                Cell::new("RSSI"),
                Cell::new("Time"),
            ]);
            for probe in &probes {
                table.add_row(vec![
                    Cell::new(probe.client_mac.as_deref().unwrap_or("-")),
                    Cell::new(truncate(&probe.ssid, 28)),
                    rssi_cell(probe.rssi.as_deref().unwrap_or("-"), probe.rssi_dbm()),
                    Cell::new(probe.timestamp.as_deref().unwrap_or("-")),
                ]);
            }
            println!("{table}");
            print_info(&format!("{} probe requests", probes.len()));
        }
    }

    Ok(())
}

fn kind_color(kind: PacketKind) -> Color {
    match kind {
        PacketKind::Beacon => Color::Green,
        PacketKind::Probe => Color::Yellow,
        PacketKind::Data => Color::Cyan,
        PacketKind::Auth => Color::Red,
        PacketKind::Other => Color::Reset,
    }
}
