//! Line classifiers for JanOS firmware output
//!
//! Every function here is pure: one raw line in, zero or one typed record out.
//! The firmware prints free-form text, so shapes that do not match are dropped
//! rather than reported as errors.

use crate::state::{
    HtmlFile, NetworkRecord, PacketKind, PasswordLogEntry, ProbeRecord, SnifferPacket,
};
use regex::Regex;
use std::sync::LazyLock;

static PACKETS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+packets?").expect("valid regex"));
static CAPTURED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)captured:\s*(\d+)").expect("valid regex"));
static MAC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}").expect("valid regex")
});
static RSSI_DBM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(-\d+)\s*dBm?").expect("valid regex"));
static RSSI_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s:,(=])(-\d+)\b").expect("valid regex"));
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+:\d+:\d+)\]").expect("valid regex"));
static CLIENT_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Client count = (\d+)").expect("valid regex"));
static PASSWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Password:\s*(.+)$").expect("valid regex"));
static HTML_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s+\S+\.html\s*$").expect("valid regex"));

/// Field separator of the quoted CSV scan listing
const NETWORK_FIELD_DELIMITER: &str = "\",\"";
const NETWORK_FIELD_COUNT: usize = 8;

/// Parse one `"index","ssid","vendor","bssid","channel","auth","rssi","band"` line.
///
/// Anything that does not start with a quote or does not split into exactly
/// eight fields is not a network line.
pub fn parse_network_line(line: &str, hidden_placeholder: &str) -> Option<NetworkRecord> {
    if !line.starts_with('"') {
        return None;
    }

    let fields: Vec<&str> = line
        .split(NETWORK_FIELD_DELIMITER)
        .map(|field| field.trim_matches('"'))
        .collect();
    if fields.len() != NETWORK_FIELD_COUNT {
        return None;
    }

    let ssid = if fields[1].is_empty() {
        hidden_placeholder.to_string()
    } else {
        fields[1].to_string()
    };

    Some(NetworkRecord {
        index: fields[0].to_string(),
        ssid,
        vendor: fields[2].to_string(),
        bssid: fields[3].to_string(),
        channel: fields[4].to_string(),
        auth: fields[5].to_string(),
        rssi: fields[6].to_string(),
        band: fields[7].to_string(),
    })
}

/// Packet total reported by the sniffer (`"42 packets"`, `"captured: 7"`).
///
/// The value replaces the previous total; the firmware prints running totals.
pub fn parse_packet_count(line: &str) -> Option<u64> {
    PACKETS_RE
        .captures(line)
        .or_else(|| CAPTURED_RE.captures(line))
        .and_then(|caps| caps[1].parse().ok())
}

/// Markers that introduce the requested SSID, in priority order
const PROBE_SSID_MARKERS: [&str; 3] = ["SSID:", "->", "looking for"];

/// Best-effort extraction of a probe request sighting.
///
/// Always yields a record; fields that cannot be found stay `None` (or the
/// placeholder for the SSID).
pub fn parse_probe_line(line: &str, hidden_placeholder: &str) -> ProbeRecord {
    let mac = MAC_RE.find(line);
    let client_mac = mac.map(|m| m.as_str().to_string());

    let ssid = PROBE_SSID_MARKERS
        .iter()
        .find_map(|marker| line.split_once(marker).map(|(_, rest)| rest))
        .map(|rest| {
            rest.split([',', '(', ')'])
                .next()
                .unwrap_or_default()
                .trim()
        })
        .filter(|ssid| !ssid.is_empty() && *ssid != "N/A" && *ssid != "unknown")
        .map_or_else(|| hidden_placeholder.to_string(), str::to_string);

    // hyphenated MACs would otherwise read as negative numbers
    let without_mac = match mac {
        Some(m) => format!("{}{}", &line[..m.start()], &line[m.end()..]),
        None => line.to_string(),
    };
    let rssi = RSSI_DBM_RE
        .captures(&without_mac)
        .or_else(|| RSSI_BARE_RE.captures(&without_mac))
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .map(|dbm| format!("{dbm}dBm"));

    let timestamp = TIMESTAMP_RE
        .captures(line)
        .map(|caps| caps[1].to_string());

    ProbeRecord {
        client_mac,
        ssid,
        rssi,
        timestamp,
    }
}

/// Events the captive portal and evil twin print while running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    ClientConnected,
    ClientCount(u32),
    /// Text after `Password:`
    PasswordSubmitted(String),
    FormSubmitted(String),
    DataSaved(String),
    ConnectionAttempt(String),
    CredentialCaptured(String),
    CaptureSaved(String),
    Error(String),
    Status(String),
}

/// One row of an ordered classification table.
///
/// The first rule whose `matches` accepts the line decides the outcome, even
/// when `extract` then yields nothing.
pub struct EventRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub extract: fn(&str) -> Option<PortalEvent>,
}

pub static PORTAL_RULES: &[EventRule] = &[
    EventRule {
        name: "client-connected",
        matches: has_client_connected,
        extract: |_| Some(PortalEvent::ClientConnected),
    },
    EventRule {
        name: "client-count",
        matches: |line| line.contains("Client count"),
        extract: |line| {
            CLIENT_COUNT_RE
                .captures(line)
                .and_then(|caps| caps[1].parse().ok())
                .map(PortalEvent::ClientCount)
        },
    },
    EventRule {
        name: "password",
        matches: |line| line.contains("Password:"),
        extract: |line| {
            let password = PASSWORD_RE
                .captures(line)
                .map(|caps| caps[1].to_string())
                .unwrap_or_default();
            Some(PortalEvent::PasswordSubmitted(password))
        },
    },
    EventRule {
        name: "form-data",
        matches: |line| {
            let lower = line.to_lowercase();
            line.contains("Form data:") || lower.contains("username:") || lower.contains("email:")
        },
        extract: |line| Some(PortalEvent::FormSubmitted(line.to_string())),
    },
    EventRule {
        name: "data-saved",
        matches: |line| line.contains("Portal data saved"),
        extract: |line| Some(PortalEvent::DataSaved(line.to_string())),
    },
    EventRule {
        name: "error",
        matches: is_error_line,
        extract: error_event,
    },
    EventRule {
        name: "status",
        matches: |line| line.contains("started successfully") || line.contains("enabled"),
        extract: status_event,
    },
];

pub static EVIL_TWIN_RULES: &[EventRule] = &[
    EventRule {
        name: "client-connected",
        matches: has_client_connected,
        extract: |_| Some(PortalEvent::ClientConnected),
    },
    EventRule {
        name: "connection-attempt",
        matches: |line| {
            let lower = line.to_lowercase();
            lower.contains("trying to connect") || lower.contains("association")
        },
        extract: |line| Some(PortalEvent::ConnectionAttempt(line.to_string())),
    },
    EventRule {
        name: "credential",
        matches: is_credential_line,
        extract: |line| Some(PortalEvent::CredentialCaptured(line.to_string())),
    },
    EventRule {
        name: "capture-saved",
        matches: is_capture_saved_line,
        extract: |line| Some(PortalEvent::CaptureSaved(line.to_string())),
    },
    EventRule {
        name: "error",
        matches: is_error_line,
        extract: error_event,
    },
    EventRule {
        name: "status",
        matches: |line| line.contains("started successfully") || line.contains("broadcasting"),
        extract: status_event,
    },
];

/// Tail of the evil twin table used while capturing handshakes
pub static HANDSHAKE_RULES: &[EventRule] = &[
    EventRule {
        name: "credential",
        matches: is_credential_line,
        extract: |line| Some(PortalEvent::CredentialCaptured(line.to_string())),
    },
    EventRule {
        name: "capture-saved",
        matches: is_capture_saved_line,
        extract: |line| Some(PortalEvent::CaptureSaved(line.to_string())),
    },
    EventRule {
        name: "error",
        matches: is_error_line,
        extract: error_event,
    },
    EventRule {
        name: "status",
        matches: |line| line.contains("started successfully") || line.contains("broadcasting"),
        extract: status_event,
    },
];

/// Error/success rows shared by the flooding attacks
pub static ATTACK_STATUS_RULES: &[EventRule] = &[
    EventRule {
        name: "error",
        matches: is_error_line,
        extract: error_event,
    },
    EventRule {
        name: "status",
        matches: |line| line.contains("started successfully") || line.contains("broadcasting"),
        extract: status_event,
    },
];

/// Evaluate `rules` top to bottom; the first matching rule decides
pub fn classify_with(rules: &[EventRule], line: &str) -> Option<PortalEvent> {
    rules
        .iter()
        .find(|rule| (rule.matches)(line))
        .and_then(|rule| (rule.extract)(line))
}

pub fn classify_portal_line(line: &str) -> Option<PortalEvent> {
    classify_with(PORTAL_RULES, line)
}

pub fn classify_evil_twin_line(line: &str) -> Option<PortalEvent> {
    classify_with(EVIL_TWIN_RULES, line)
}

pub fn classify_handshake_line(line: &str) -> Option<PortalEvent> {
    classify_with(HANDSHAKE_RULES, line)
}

pub fn classify_attack_line(line: &str) -> Option<PortalEvent> {
    classify_with(ATTACK_STATUS_RULES, line)
}

/// Answer to a start command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    Failed(String),
    Started(String),
}

/// Classify a line drained right after a start command.
///
/// Failure keywords win over success markers, which are matched
/// case-insensitively.
pub fn classify_ack(line: &str, success_markers: &[&str]) -> Option<Acknowledgement> {
    if is_error_line(line) {
        return Some(Acknowledgement::Failed(line.to_string()));
    }
    let lower = line.to_lowercase();
    success_markers
        .iter()
        .any(|marker| lower.contains(marker))
        .then(|| Acknowledgement::Started(line.to_string()))
}

pub fn is_error_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("error") || lower.contains("failed")
}

fn has_client_connected(line: &str) -> bool {
    line.contains("Client connected")
}

fn is_credential_line(line: &str) -> bool {
    line.contains("Password:") || line.contains("Handshake captured")
}

fn is_capture_saved_line(line: &str) -> bool {
    line.contains(".pcap") || line.contains(".cap") || line.to_lowercase().contains("handshake saved")
}

fn error_event(line: &str) -> Option<PortalEvent> {
    Some(PortalEvent::Error(line.to_string()))
}

fn status_event(line: &str) -> Option<PortalEvent> {
    Some(PortalEvent::Status(line.to_string()))
}

/// Map a sniffer packet type column to its coarse kind
pub fn packet_kind(packet_type: &str) -> PacketKind {
    let upper = packet_type.to_uppercase();
    if upper.contains("BEACON") {
        PacketKind::Beacon
    } else if upper.contains("PROBE") {
        PacketKind::Probe
    } else if upper.contains("DATA") {
        PacketKind::Data
    } else if upper.contains("AUTH") {
        // also covers DEAUTH
        PacketKind::Auth
    } else {
        PacketKind::Other
    }
}

/// `TYPE SRC DST SIZE INFO...` rows of `show_sniffer_results`
pub fn parse_sniffer_line(line: &str) -> Option<SnifferPacket> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }
    Some(SnifferPacket {
        packet_type: parts[0].to_string(),
        kind: packet_kind(parts[0]),
        src: parts[1].to_string(),
        dst: parts[2].to_string(),
        size: parts[3].to_string(),
        info: parts[4..].join(" "),
    })
}

/// `TIMESTAMP SSID DATA...` rows of `show_pass`
pub fn parse_password_line(line: &str) -> Option<PasswordLogEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }
    Some(PasswordLogEntry {
        timestamp: parts[0].to_string(),
        ssid: parts[1].to_string(),
        data: parts[2..].join(" "),
    })
}

/// `N name.html` rows of `list_sd`
pub fn parse_html_file_line(line: &str) -> Option<HtmlFile> {
    if !HTML_FILE_RE.is_match(line) {
        return None;
    }
    let mut parts = line.split_whitespace();
    let number = parts.next()?;
    let name = parts.next()?;
    Some(HtmlFile {
        number: number.to_string(),
        name: name.to_string(),
        display: line.trim().to_string(),
    })
}

/// Header rows of show_* listings start with one of these words
pub fn is_listing_header(line: &str, headers: &[&str]) -> bool {
    headers.iter().any(|header| line.starts_with(header))
}
