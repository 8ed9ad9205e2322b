use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::classify::{is_listing_header, parse_packet_count, parse_probe_line, parse_sniffer_line};
use crate::session::{AckPolicy, FeatureLaunch, SessionManager, StartReport};
use crate::state::{Feature, FeatureState, ProbeRecord, SnifferReport};

const RESULT_HEADERS: [&str; 2] = ["Sniffer", "Total"];
const PROBE_HEADERS: [&str; 2] = ["Probe", "Total"];

/// Start packet capture; reuses the last scan when there is one
pub async fn start_sniffer(session: &mut SessionManager) -> Result<StartReport> {
    let has_networks = session.get_state_ref().lock().await.has_networks();
    let command = if has_networks {
        "start_sniffer_noscan"
    } else {
        "start_sniffer"
    };

    session
        .start_feature(FeatureLaunch {
            feature: Feature::Sniffer,
            command: command.to_string(),
            ack: AckPolicy::None,
            classify: parse_packet_count,
            apply: FeatureState::set_packets,
        })
        .await
}

/// The firmware only answers result queries once capture has stopped
async fn stop_before_query(session: &mut SessionManager) {
    if session.stop_feature(Feature::Sniffer).await {
        debug!("Sniffer stopped ahead of result query");
        sleep(session.config().stop_settle).await;
    }
}

pub async fn show_results(session: &mut SessionManager) -> Result<SnifferReport> {
    stop_before_query(session).await;
    let window = session.config().response_window;
    let lines = session.exchange("show_sniffer_results", window).await?;

    let mut report = SnifferReport::default();
    for line in lines {
        if is_listing_header(&line, &RESULT_HEADERS) {
            continue;
        }
        match parse_sniffer_line(&line) {
            Some(packet) => report.packets.push(packet),
            None => report.other_lines.push(line),
        }
    }

    info!(
        "Sniffer results: {} packets, {} other lines",
        report.packets.len(),
        report.other_lines.len()
    );
    Ok(report)
}

pub async fn show_probes(session: &mut SessionManager) -> Result<Vec<ProbeRecord>> {
    stop_before_query(session).await;
    let window = session.config().response_window;
    let placeholder = session.config().hidden_ssid.clone();
    let lines = session.exchange("show_probes", window).await?;

    let probes: Vec<ProbeRecord> = lines
        .iter()
        .filter(|line| !is_listing_header(line, &PROBE_HEADERS))
        .map(|line| parse_probe_line(line, &placeholder))
        .collect();

    info!("Collected {} probe requests", probes.len());
    Ok(probes)
}
