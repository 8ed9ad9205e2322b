mod report;
mod runner;
mod tests;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use janos_core::EngineConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Serial port of the board (e.g., /dev/ttyUSB0)
    #[arg(short, long, env = "JANOS_PORT")]
    port: Option<String>,

    /// Auto-detect connected board
    #[arg(short, long, conflicts_with = "port")]
    auto_detect: bool,

    /// Session config file (JSON)
    #[arg(long, env = "JANOS_CONFIG")]
    config: Option<PathBuf>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Scan timeout (e.g., 15s)
    #[arg(long, value_parser = humantime::parse_duration)]
    scan_timeout: Option<Duration>,

    /// Host to ping through the board (the ping check is skipped without it)
    #[arg(long)]
    ping_host: Option<String>,

    /// Test categories to run (comma-separated: connection,scan,sniffer,system)
    #[arg(short, long, value_delimiter = ',')]
    tests: Option<Vec<String>>,

    /// Output format
    #[arg(short = 'f', long, default_value = "human")]
    format: OutputFormat,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Non-interactive mode (disables progress bars, suitable for nohup/background execution)
    #[arg(long)]
    non_interactive: bool,

    /// Quiet mode (only warnings and errors are logged)
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.quiet {
        EnvFilter::new("warn")
    } else if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Check if we're connected to a TTY
    let is_tty = atty::is(atty::Stream::Stdout);
    let non_interactive = args.non_interactive || !is_tty;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    println!(
        "{separator}",
        separator = "╔════════════════════════════════════════════════════════╗".bold()
    );
    println!(
        "{title}",
        title = "║            JanOS Hardware Test Suite v0.1.0            ║"
            .bold()
            .cyan()
    );
    println!(
        "{separator}",
        separator = "╚════════════════════════════════════════════════════════╝".bold()
    );
    println!();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(baud) = args.baud {
        config = config.with_baud_rate(baud);
    }
    if let Some(timeout) = args.scan_timeout {
        config = config.with_scan_timeout(timeout);
    }

    let port = match args.port {
        Some(port) => port,
        None if args.auto_detect => auto_detect_device()?,
        None => first_existing_port()
            .context("No device found. Please specify --port or use --auto-detect")?,
    };

    let mut runner = runner::TestRunner::new(
        port,
        config,
        args.ping_host,
        args.verbose,
        non_interactive,
    )?;

    let report = if let Some(test_list) = args.tests {
        runner.run_specific_tests(test_list).await
    } else {
        runner.run_all_tests().await
    };
    runner.shutdown().await;
    let report = report?;

    match args.format {
        OutputFormat::Human => {
            report.print_summary();
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            if let Some(output_path) = args.output {
                std::fs::write(output_path, json)?;
            } else {
                println!("{json}");
            }
        }
        OutputFormat::Markdown => {
            let markdown = generate_markdown_report(&report);
            if let Some(output_path) = args.output {
                std::fs::write(output_path, markdown)?;
            } else {
                println!("{markdown}");
            }
        }
    }

    // Exit with appropriate code
    if report.tests_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

const COMMON_PORTS: &[&str] = &[
    "/dev/ttyUSB0", // CP2102/CH340 based boards
    "/dev/ttyUSB1",
    "/dev/ttyACM0", // native USB on ESP32-S3/C5
    "/dev/ttyACM1",
    "/dev/tty.usbserial",
    "/dev/tty.usbmodem",
    "/dev/tty.SLAB_USBtoUART",
];

fn first_existing_port() -> Option<String> {
    let port = COMMON_PORTS
        .iter()
        .find(|port| std::path::Path::new(port).exists())?;
    eprintln!(
        "{arrow} Found device at {port}",
        arrow = "→".green(),
        port = port.bold()
    );
    Some(port.to_string())
}

fn auto_detect_device() -> Result<String> {
    eprintln!("{arrow} Auto-detecting JanOS board...", arrow = "→".cyan());

    // /dev/serial/by-id names carry the USB bridge chip
    if let Ok(entries) = std::fs::read_dir("/dev/serial/by-id") {
        for entry in entries.flatten() {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let lower_name = name.to_lowercase();
            let known_bridge = ["esp32", "espressif", "cp210", "ch340", "ch9102", "jtag"]
                .iter()
                .any(|chip| lower_name.contains(chip));
            if known_bridge && let Ok(path) = entry.path().canonicalize() {
                eprintln!(
                    "{check} Found device: {name} -> {path}",
                    check = "✓".green(),
                    name = name.bold(),
                    path = path.display()
                );
                return Ok(path.to_string_lossy().to_string());
            }
        }
    }

    if let Some(port) = first_existing_port() {
        return Ok(port);
    }

    anyhow::bail!("No JanOS board detected. Please connect a board or specify --port")
}

fn generate_markdown_report(report: &report::TestReport) -> String {
    use std::fmt::Write as _;

    let mut md = String::new();
    let info = &report.device_info;
    let _ = writeln!(md, "# JanOS Hardware Test Report\n");
    let _ = writeln!(md, "- **Test ID:** {}", report.test_id);
    let _ = writeln!(md, "- **Date:** {}", report.timestamp.to_rfc3339());
    let _ = writeln!(md, "- **Port:** `{}`", info.port);
    if let Some(networks) = info.networks_seen {
        let _ = writeln!(md, "- **Networks seen:** {networks}");
    }
    let _ = writeln!(
        md,
        "- **Result:** {passed}/{total} passed, {failed} failed\n",
        passed = report.tests_passed,
        total = report.tests_run,
        failed = report.tests_failed
    );

    for stat in &report.category_stats {
        let _ = writeln!(
            md,
            "## {category} ({passed}/{total})\n",
            category = stat.category,
            passed = stat.passed,
            total = stat.total
        );
        let _ = writeln!(md, "| Test | Result | Duration | Details |");
        let _ = writeln!(md, "|------|--------|----------|---------|");
        for result in report
            .test_results
            .iter()
            .filter(|result| result.category == stat.category)
        {
            let details = match &result.error {
                Some(error) => error.replace('|', "\\|"),
                None => "OK".to_string(),
            };
            let _ = writeln!(
                md,
                "| {name} | {status} | {duration}ms | {details} |",
                name = result.name,
                status = if result.passed { "✅ Pass" } else { "❌ Fail" },
                duration = result.duration_ms
            );
        }
        md.push('\n');
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(md, "## Recommendations\n");
        for rec in &report.recommendations {
            let _ = writeln!(md, "- {rec}");
        }
    }

    md
}
