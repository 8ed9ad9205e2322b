use anyhow::Result;
use janos_core::{portal, system};
use serde_json::{Value, json};

use crate::define_test;
use crate::tests::{Test, TestContext};

pub fn get_tests() -> Vec<Test> {
    vec![
        define_test!(
            "SD Card Listing",
            "List files on the SD card",
            test_sd_listing
        ),
        define_test!(
            "Portal Templates",
            "Parse the HTML templates available for the portal",
            test_portal_templates
        ),
        define_test!(
            "Ping",
            "Ping a host through the board's station link",
            test_ping
        ),
    ]
}

async fn test_sd_listing(ctx: &mut TestContext<'_>) -> Result<Value> {
    let lines = system::list_sd(ctx.session).await?;

    anyhow::ensure!(!lines.is_empty(), "No SD card listing returned");

    Ok(json!({
        "lines": lines.len(),
        "errors": lines
            .iter()
            .filter(|line| janos_core::classify::is_error_line(line))
            .count(),
    }))
}

async fn test_portal_templates(ctx: &mut TestContext<'_>) -> Result<Value> {
    let files = portal::list_html_files(ctx.session).await?;

    Ok(json!({
        "templates": files.iter().map(|file| &file.name).collect::<Vec<_>>(),
    }))
}

async fn test_ping(ctx: &mut TestContext<'_>) -> Result<Value> {
    let Some(host) = ctx.ping_host else {
        return Ok(json!({ "skipped": "no --ping-host given" }));
    };

    let lines = system::ping(ctx.session, host).await?;
    anyhow::ensure!(!lines.is_empty(), "No ping output for {host}");

    Ok(json!({
        "host": host,
        "lines": lines,
    }))
}
