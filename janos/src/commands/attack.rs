use anyhow::Result;
use janos_core::SessionManager;
use janos_core::attack::{self, AttackKind, Targeting};
use janos_core::scan;
use std::time::Duration;

use crate::commands::{live, scan as scan_cmd};
use crate::output::{OutputFormat, print_output};
use crate::utils::{print_info, print_success, print_warning};

pub async fn handle_attack(
    session: &mut SessionManager,
    kind: AttackKind,
    select: Option<String>,
    duration: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    // A fresh session has no selection, so targets come from a new scan
    if let Some(select) = select {
        let outcome = scan_cmd::run_scan(session, format).await?;
        if format == OutputFormat::Table {
            scan_cmd::print_networks(&outcome.networks);
        }
        let selection = scan::select_networks(session, &select).await?;
        if format == OutputFormat::Table {
            print_success(&format!("Selected networks: {selection}"));
        }
    }

    let targeting = attack::start(session, kind).await?;
    match format {
        OutputFormat::Json => print_output(&targeting, format),
        OutputFormat::Table => {
            print_success(&format!("{kind} started"));
            match &targeting {
                Targeting::Selected(selection) => {
                    print_info(&format!("Targeting networks {selection}"))
                }
                Targeting::AllNetworks => {
                    print_warning("No networks selected; capturing from all networks in turn")
                }
                Targeting::Firmware => {}
            }
        }
    }

    live::run_until_stopped(session, kind.feature(), duration, format).await
}
