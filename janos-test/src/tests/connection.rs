use anyhow::Result;
use serde_json::{Value, json};
use std::time::{Duration, Instant};

use crate::define_test;
use crate::tests::{Test, TestContext};

pub fn get_tests() -> Vec<Test> {
    vec![
        define_test!(
            "Link Open",
            "Check the serial link is open and no feature is running",
            test_link_open
        ),
        define_test!(
            "Write Pacing",
            "Check consecutive writes honour the settle delay",
            test_write_pacing
        ),
        define_test!(
            "Command Round Trip",
            "Send a command and wait for any response lines",
            test_command_round_trip
        ),
    ]
}

async fn test_link_open(ctx: &mut TestContext<'_>) -> Result<Value> {
    anyhow::ensure!(ctx.session.is_open().await, "Serial link is closed");

    let running = ctx.session.running_features().await;
    anyhow::ensure!(
        running.is_empty(),
        "Features already running: {running:?}"
    );

    Ok(json!({
        "device": ctx.session.device(),
        "baud_rate": ctx.session.config().baud_rate,
    }))
}

async fn test_write_pacing(ctx: &mut TestContext<'_>) -> Result<Value> {
    let writes = 5;
    let settle = ctx.session.config().write_settle;
    let start = Instant::now();

    for _ in 0..writes {
        // stop is a no-op when nothing runs
        anyhow::ensure!(ctx.session.send("stop").await, "Write failed");
    }
    let elapsed = start.elapsed();

    anyhow::ensure!(
        elapsed >= settle * writes,
        "Writes were not paced: {}ms for {} writes",
        elapsed.as_millis(),
        writes
    );

    // Drain the replies so later tests start clean
    let drained = ctx.session.channel().collect_for(Duration::from_secs(1)).await;

    Ok(json!({
        "writes": writes,
        "elapsed_ms": elapsed.as_millis(),
        "settle_ms": settle.as_millis(),
        "drained_lines": drained.len(),
    }))
}

async fn test_command_round_trip(ctx: &mut TestContext<'_>) -> Result<Value> {
    let window = ctx.session.config().response_window;
    let start = Instant::now();
    let lines = ctx.session.exchange("list_sd", window).await?;

    anyhow::ensure!(!lines.is_empty(), "No response from device");

    Ok(json!({
        "lines": lines.len(),
        "window_ms": window.as_millis(),
        "elapsed_ms": start.elapsed().as_millis(),
    }))
}
