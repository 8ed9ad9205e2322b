use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timing and protocol constants for one session.
///
/// Every field has a default matching the JanOS firmware, so a config file
/// only needs to list what it overrides. Durations use humantime strings
/// (`"100ms"`, `"15s"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub baud_rate: u32,
    /// Appended to every command written to the link
    pub line_terminator: String,
    /// Mandatory pause after each write; the firmware drops commands sent back to back
    #[serde(with = "humantime_format")]
    pub write_settle: Duration,
    /// How often `read_line` re-checks the link for data
    #[serde(with = "humantime_format")]
    pub read_poll: Duration,
    /// OS-level timeout handed to the serial driver
    #[serde(with = "humantime_format")]
    pub os_read_timeout: Duration,
    #[serde(with = "humantime_format")]
    pub scan_timeout: Duration,
    /// Line marking the end of a scan listing
    pub scan_sentinel: String,
    /// Collection window for show_* and system exchanges
    #[serde(with = "humantime_format")]
    pub response_window: Duration,
    /// Listener sleep when the link is idle; bounds stop latency
    #[serde(with = "humantime_format")]
    pub listener_idle: Duration,
    /// How long a stop waits for the listener task to exit
    #[serde(with = "humantime_format")]
    pub listener_grace: Duration,
    /// Pause between a start command and its acknowledgement drain
    #[serde(with = "humantime_format")]
    pub ack_settle: Duration,
    #[serde(with = "humantime_format")]
    pub ack_window: Duration,
    /// Pause after stopping the sniffer before asking for its results
    #[serde(with = "humantime_format")]
    pub stop_settle: Duration,
    pub hidden_ssid: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            line_terminator: "\r\n".to_string(),
            write_settle: Duration::from_millis(100),
            read_poll: Duration::from_millis(10),
            os_read_timeout: Duration::from_secs(2),
            scan_timeout: Duration::from_secs(15),
            scan_sentinel: "Scan results printed".to_string(),
            response_window: Duration::from_secs(5),
            listener_idle: Duration::from_millis(100),
            listener_grace: Duration::from_secs(2),
            ack_settle: Duration::from_secs(2),
            ack_window: Duration::from_secs(3),
            stop_settle: Duration::from_secs(1),
            hidden_ssid: "<hidden>".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load overrides from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }
}

mod humantime_format {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}
