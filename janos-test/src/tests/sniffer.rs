use anyhow::Result;
use janos_core::{Feature, sniffer};
use serde_json::{Value, json};
use std::time::Duration;

use crate::define_test;
use crate::tests::{Test, TestContext};

const CAPTURE_TIME: Duration = Duration::from_secs(10);

pub fn get_tests() -> Vec<Test> {
    vec![
        define_test!(
            "Capture",
            "Run the sniffer and watch the packet counter",
            test_capture
        ),
        define_test!(
            "Sniffer Results",
            "Fetch captured packet summaries",
            test_results
        ),
        define_test!(
            "Probe Requests",
            "Fetch captured probe requests",
            test_probes
        ),
    ]
}

async fn test_capture(ctx: &mut TestContext<'_>) -> Result<Value> {
    let report = sniffer::start_sniffer(ctx.session).await?;
    tokio::time::sleep(CAPTURE_TIME).await;

    let during = ctx.session.feature_state(Feature::Sniffer).await;
    let stopped = ctx.session.stop_feature(Feature::Sniffer).await;
    anyhow::ensure!(stopped, "Sniffer was not running when stopped");

    let after = ctx.session.feature_state(Feature::Sniffer).await;
    anyhow::ensure!(!after.running, "Sniffer still marked running");
    anyhow::ensure!(
        during.lines_seen > 0,
        "No telemetry in {}",
        humantime::format_duration(CAPTURE_TIME)
    );

    Ok(json!({
        "acknowledgement": report.acknowledgement,
        "packets": after.packets,
        "lines_seen": after.lines_seen,
    }))
}

async fn test_results(ctx: &mut TestContext<'_>) -> Result<Value> {
    let report = sniffer::show_results(ctx.session).await?;

    anyhow::ensure!(
        !report.packets.is_empty() || !report.other_lines.is_empty(),
        "No sniffer results returned"
    );

    Ok(json!({
        "packets": report.packets.len(),
        "other_lines": report.other_lines.len(),
    }))
}

async fn test_probes(ctx: &mut TestContext<'_>) -> Result<Value> {
    let probes = sniffer::show_probes(ctx.session).await?;
    let with_rssi = probes.iter().filter(|probe| probe.rssi_dbm().is_some()).count();

    Ok(json!({
        "probes": probes.len(),
        "with_rssi": with_rssi,
    }))
}
