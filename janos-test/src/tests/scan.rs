use anyhow::Result;
use janos_core::scan;
use serde_json::{Value, json};

use crate::define_test;
use crate::tests::{Test, TestContext};

pub fn get_tests() -> Vec<Test> {
    vec![
        define_test!(
            "Network Scan",
            "Scan for access points and wait for the completion marker",
            test_network_scan
        ),
        define_test!(
            "Select All",
            "Select every scanned network",
            test_select_all
        ),
        define_test!(
            "Rescan Clears Selection",
            "A new scan drops the previous selection",
            test_rescan_clears_selection
        ),
    ]
}

async fn test_network_scan(ctx: &mut TestContext<'_>) -> Result<Value> {
    let outcome = scan::scan_networks(ctx.session).await?;

    anyhow::ensure!(outcome.completed, "Scan did not finish before the timeout");
    anyhow::ensure!(!outcome.networks.is_empty(), "No networks found");

    let strongest = outcome
        .networks
        .iter()
        .filter_map(|network| network.rssi_dbm().map(|dbm| (dbm, network)))
        .max_by_key(|(dbm, _)| *dbm);

    Ok(json!({
        "networks": outcome.networks.len(),
        "strongest_ssid": strongest.map(|(_, network)| network.ssid.clone()),
        "strongest_rssi": strongest.map(|(dbm, _)| dbm),
    }))
}

async fn test_select_all(ctx: &mut TestContext<'_>) -> Result<Value> {
    if !ctx.session.get_state().await.has_networks() {
        scan::scan_networks(ctx.session).await?;
    }

    let selection = scan::select_networks(ctx.session, "all").await?;
    let state = ctx.session.get_state().await;

    anyhow::ensure!(
        state.selection.as_deref() == Some(selection.as_str()),
        "Selection was not recorded"
    );
    anyhow::ensure!(
        selection.split_whitespace().count() == state.networks.len(),
        "Selection does not cover every network"
    );

    Ok(json!({ "selection": selection }))
}

async fn test_rescan_clears_selection(ctx: &mut TestContext<'_>) -> Result<Value> {
    let outcome = scan::scan_networks(ctx.session).await?;
    let state = ctx.session.get_state().await;

    anyhow::ensure!(
        state.selection.is_none(),
        "Selection survived a new scan"
    );

    Ok(json!({
        "networks": outcome.networks.len(),
        "completed": outcome.completed,
    }))
}
