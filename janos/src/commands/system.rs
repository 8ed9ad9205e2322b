use anyhow::Result;
use janos_core::{SessionManager, system};
use std::io::Write;

use crate::cli::SystemCommands;
use crate::output::{OutputFormat, print_output};
use crate::utils::{is_interactive, print_info, print_success, print_warning};

pub async fn handle_system(
    session: &mut SessionManager,
    subcommand: SystemCommands,
    format: OutputFormat,
) -> Result<()> {
    match subcommand {
        SystemCommands::Reboot { yes } => {
            if !yes && !confirm("Reboot the board?")? {
                print_warning("Reboot cancelled");
                return Ok(());
            }
            system::reboot(session).await?;
            print_success("Reboot command sent");
        }

        SystemCommands::Ping { host } => {
            print_info(&format!("Pinging {host}..."));
            let lines = system::ping(session, &host).await?;
            print_lines(&lines, format);
        }

        SystemCommands::Ls => {
            let lines = system::list_sd(session).await?;
            print_lines(&lines, format);
        }
    }

    Ok(())
}

fn print_lines(lines: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_output(lines, format),
        OutputFormat::Table => {
            if lines.is_empty() {
                print_warning("No response from device");
            }
            for line in lines {
                println!("{line}");
            }
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    if !is_interactive() {
        print_warning("Not a terminal; pass --yes to confirm");
        return Ok(false);
    }
    eprint!("{question} [y/N]: ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
