use anyhow::Result;
use comfy_table::Cell;
use indicatif::{ProgressBar, ProgressStyle};
use janos_core::{Feature, FeatureState, SessionManager};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::output::{OutputFormat, create_table, print_output, truncate};
use crate::utils::{is_interactive, print_info};

const REFRESH: Duration = Duration::from_millis(500);

/// Show live counters of `feature` until Enter is pressed or `duration`
/// elapses, then stop it and print what it gathered.
pub async fn run_until_stopped(
    session: &mut SessionManager,
    feature: Feature,
    duration: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    let interactive = is_interactive();
    if format == OutputFormat::Table {
        match duration {
            Some(duration) if !interactive => print_info(&format!(
                "{feature} running for {}",
                humantime::format_duration(duration)
            )),
            _ => print_info(&format!("{feature} running. Press Enter to stop")),
        }
    }

    let spinner = if format == OutputFormat::Table && interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    } else {
        ProgressBar::hidden()
    };

    let deadline = duration.map(|duration| Instant::now() + duration);
    let mut enter = watch_enter(interactive);
    let mut stdin_open = interactive;
    let mut ticker = tokio::time::interval(REFRESH);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = session.feature_state(feature).await;
                if !state.running {
                    break;
                }
                spinner.set_message(describe(feature, &state));
            }
            pressed = enter.recv(), if stdin_open => {
                match pressed {
                    Some(()) => break,
                    // closed stdin: only the deadline or Ctrl+C can stop us
                    None => stdin_open = false,
                }
            }
            _ = async {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => break,
        }
    }

    spinner.finish_and_clear();
    session.stop_feature(feature).await;
    let state = session.feature_state(feature).await;
    print_summary(feature, &state, format);
    Ok(())
}

/// Fires once when a line is read from stdin.
///
/// Reads on a plain thread; a blocking read inside the runtime would hold up
/// its shutdown.
fn watch_enter(enabled: bool) -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    if enabled {
        std::thread::spawn(move || {
            let mut line = String::new();
            if matches!(std::io::stdin().read_line(&mut line), Ok(read) if read > 0) {
                let _ = tx.send(());
            }
        });
    }
    rx
}

/// One-line progress text for the spinner
fn describe(feature: Feature, state: &FeatureState) -> String {
    let mut text = match feature {
        Feature::Sniffer => format!("{} packets captured", state.packets),
        Feature::Portal => format!(
            "{} clients, {} forms submitted",
            state.clients, state.forms_submitted
        ),
        Feature::EvilTwin => format!(
            "{} as {}, {} clients, {} captured",
            feature,
            state.target_ssid.as_deref().unwrap_or("?"),
            state.clients,
            state.captured.len()
        ),
        Feature::Handshake => format!("{} handshakes captured", state.captured.len()),
        _ => format!("{} lines from device", state.lines_seen),
    };

    if let Some(last) = state.last_submitted.as_deref().or(state.last_error.as_deref()) {
        text.push_str(" | ");
        text.push_str(&truncate(last, 60));
    }
    text
}

pub fn print_summary(feature: Feature, state: &FeatureState, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_output(state, format),
        OutputFormat::Table => {
            let mut table = create_table();
            table.set_header(vec![Cell::new(feature.to_string()), Cell::new("Value")]);

            if let Some(started) = state
                .started_at
                .and_then(|secs| chrono::DateTime::from_timestamp(secs as i64, 0))
            {
                table.add_row(vec![
                    Cell::new("Started"),
                    Cell::new(started.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                ]);
            }
            table.add_row(vec![
                Cell::new("Lines received"),
                Cell::new(state.lines_seen.to_string()),
            ]);

            match feature {
                Feature::Sniffer => {
                    table.add_row(vec![
                        Cell::new("Packets"),
                        Cell::new(state.packets.to_string()),
                    ]);
                }
                Feature::Portal | Feature::EvilTwin => {
                    if let Some(target) = &state.target_ssid {
                        table.add_row(vec![Cell::new("Target"), Cell::new(target)]);
                    }
                    table.add_row(vec![
                        Cell::new("Clients"),
                        Cell::new(state.clients.to_string()),
                    ]);
                    table.add_row(vec![
                        Cell::new("Forms submitted"),
                        Cell::new(state.forms_submitted.to_string()),
                    ]);
                }
                _ => {}
            }

            for (index, captured) in state.captured.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(format!("Captured #{}", index + 1)),
                    Cell::new(truncate(captured, 70)),
                ]);
            }
            for (label, value) in [
                ("Last submitted", &state.last_submitted),
                ("Last notice", &state.last_notice),
                ("Last status", &state.last_status),
                ("Last error", &state.last_error),
            ] {
                if let Some(value) = value {
                    table.add_row(vec![Cell::new(label), Cell::new(truncate(value, 70))]);
                }
            }

            println!("{table}");
        }
    }
}
