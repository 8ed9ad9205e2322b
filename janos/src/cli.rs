use clap::{Parser, Subcommand};
use janos_core::attack::AttackKind;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "janos")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Serial device of the JanOS board (e.g., /dev/ttyUSB0)
    #[arg(short, long, global = true, env = "JANOS_PORT")]
    pub port: Option<String>,

    /// JSON file overriding engine timings
    #[arg(long, global = true, env = "JANOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Baud rate of the serial link
    #[arg(short = 'b', long, global = true)]
    pub baud: Option<u32>,

    /// How long a network scan may take (e.g., 20s)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub scan_timeout: Option<Duration>,

    /// Output in JSON format
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for nearby networks
    Scan {
        /// Networks to select afterwards ("1 3" or "all")
        #[arg(short, long)]
        select: Option<String>,
    },

    /// Capture packets until Enter is pressed
    Sniffer {
        /// Stop automatically after this long (e.g., 30s)
        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },

    /// Show captured sniffer packets
    Results,

    /// Show captured probe requests
    Probes,

    /// Run a deauth, blackout, SAE overflow or handshake capture attack
    Attack {
        /// deauth, blackout, sae-overflow or handshake
        kind: AttackKind,

        /// Scan first and select these networks ("1 3" or "all")
        #[arg(short, long)]
        select: Option<String>,

        /// Stop automatically after this long
        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },

    /// Start a captive portal with an HTML template from the SD card
    Portal {
        /// SSID of the open access point
        #[arg(short, long, default_value = janos_core::portal::DEFAULT_PORTAL_SSID)]
        ssid: String,

        /// Number of the HTML file as listed by the board
        #[arg(long)]
        html: String,

        /// Stop automatically after this long
        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },

    /// Impersonate a scanned network with a captive portal
    EvilTwin {
        /// Index of the target network in the scan listing
        #[arg(short, long)]
        target: String,

        /// Number of the HTML file as listed by the board
        #[arg(long)]
        html: String,

        /// Stop automatically after this long
        #[arg(long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,
    },

    /// Show credentials captured by the portal
    Passwords,

    /// Board maintenance commands
    System {
        #[command(subcommand)]
        subcommand: SystemCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Reboot the board
    Reboot {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Ping a host from the board
    Ping {
        /// Host name or IP address
        host: String,
    },
    /// List files on the SD card
    Ls,
}
