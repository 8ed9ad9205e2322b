use anyhow::{Result, bail};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::classify::parse_network_line;
use crate::error::SessionError;
use crate::session::SessionManager;
use crate::state::{Feature, NetworkRecord};

static SELECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s]+$").expect("valid regex"));

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub networks: Vec<NetworkRecord>,
    /// The completion marker arrived before the scan timeout
    pub completed: bool,
}

/// Run a network scan and replace the session's network list with its result.
///
/// A scan that times out is not an error; whatever arrived is kept and
/// `completed` is `false`.
pub async fn scan_networks(session: &mut SessionManager) -> Result<ScanOutcome> {
    session.begin_foreground(Feature::Scan).await?;
    session.get_state_ref().lock().await.clear_networks();

    let config = session.config().clone();
    info!("Scanning for networks (up to {:?})", config.scan_timeout);

    let collected = if session.send("scan_networks").await {
        session
            .channel()
            .collect_until(config.scan_timeout, |line| {
                line.contains(&config.scan_sentinel)
            })
            .await
    } else {
        Default::default()
    };

    let networks: Vec<NetworkRecord> = collected
        .lines
        .iter()
        .filter_map(|line| parse_network_line(line, &config.hidden_ssid))
        .collect();
    debug!(
        "Scan produced {} records from {} lines",
        networks.len(),
        collected.lines.len()
    );

    {
        let state_ref = session.get_state_ref();
        let mut state = state_ref.lock().await;
        state.networks = networks.clone();
        state.scan_completed = collected.sentinel_seen;
    }
    session.end_foreground(Feature::Scan).await;

    Ok(ScanOutcome {
        networks,
        completed: collected.sentinel_seen,
    })
}

/// Normalize user selection text for `select_networks`.
///
/// `all` expands to every index `1..=network_count`; anything else must be
/// digits and whitespace and is passed through as entered.
pub fn expand_selection(text: &str, network_count: usize) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SessionError::NoSelection.into());
    }

    if text.eq_ignore_ascii_case("all") {
        if network_count == 0 {
            return Err(SessionError::NoScanResults.into());
        }
        return Ok((1..=network_count)
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join(" "));
    }

    if !SELECTION_RE.is_match(text) {
        return Err(SessionError::InvalidSelection(text.to_string()).into());
    }
    Ok(text.to_string())
}

/// Select networks from the latest scan; returns the expanded selection.
///
/// On any failure the previous selection is kept and nothing is sent.
pub async fn select_networks(session: &mut SessionManager, text: &str) -> Result<String> {
    let state_ref = session.get_state_ref();
    let network_count = {
        let state = state_ref.lock().await;
        if !state.has_networks() {
            return Err(SessionError::NoScanResults.into());
        }
        state.networks.len()
    };

    let selection = expand_selection(text, network_count)?;
    if !session.send(&format!("select_networks {selection}")).await {
        bail!("Failed to send selection to {}", session.device());
    }

    state_ref.lock().await.selection = Some(selection.clone());
    info!("Selected networks: {}", selection);
    Ok(selection)
}
