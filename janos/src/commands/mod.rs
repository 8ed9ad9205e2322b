mod attack;
mod live;
mod portal;
mod scan;
mod sniffer;
mod system;

use anyhow::{Context, Result};
use janos_core::{EngineConfig, SessionManager};
use tracing::{debug, info};

use crate::cli::{Cli, Commands};
use crate::output::OutputFormat;
use crate::utils::{print_info, print_warning};

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Determine output format
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let port = cli
        .port
        .clone()
        .context("No serial port given. Use --port or set JANOS_PORT")?;
    let config = load_config(&cli)?;

    debug!("Session config: {:?}", config);
    let mut session = SessionManager::open(&port, config)?;
    info!("Session open on {} ({} baud)", port, session.config().baud_rate);
    if output_format == OutputFormat::Table {
        print_info(&format!("Connected to {port}"));
    }

    let result = tokio::select! {
        result = dispatch(&mut session, cli.command, output_format) => result,
        _ = tokio::signal::ctrl_c() => {
            print_warning("Interrupted, stopping running features...");
            Ok(())
        }
    };

    // Whatever was left running is summarized before the link closes
    for feature in session.stop_all().await {
        info!("Stopped {} on exit", feature);
        let state = session.feature_state(feature).await;
        live::print_summary(feature, &state, output_format);
    }
    session.shutdown().await;
    info!("Session on {} closed", port);
    result
}

async fn dispatch(
    session: &mut SessionManager,
    command: Commands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Commands::Scan { select } => scan::handle_scan(session, select, format).await,
        Commands::Sniffer { duration } => sniffer::handle_sniffer(session, duration, format).await,
        Commands::Results => sniffer::handle_results(session, format).await,
        Commands::Probes => sniffer::handle_probes(session, format).await,
        Commands::Attack {
            kind,
            select,
            duration,
        } => attack::handle_attack(session, kind, select, duration, format).await,
        Commands::Portal {
            ssid,
            html,
            duration,
        } => portal::handle_portal(session, &ssid, &html, duration, format).await,
        Commands::EvilTwin {
            target,
            html,
            duration,
        } => portal::handle_evil_twin(session, &target, &html, duration, format).await,
        Commands::Passwords => portal::handle_passwords(session, format).await,
        Commands::System { subcommand } => system::handle_system(session, subcommand, format).await,
    }
}

/// Defaults, then the config file, then command-line overrides
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(baud) = cli.baud {
        config = config.with_baud_rate(baud);
    }
    if let Some(timeout) = cli.scan_timeout {
        config = config.with_scan_timeout(timeout);
    }
    Ok(config)
}
