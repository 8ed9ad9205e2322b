use crate::classify::PortalEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Peripheral capabilities with a running/idle lifecycle
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Feature {
    Scan,
    Sniffer,
    Deauth,
    Blackout,
    SaeOverflow,
    Handshake,
    Portal,
    EvilTwin,
}

/// One row of a `scan_networks` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Index as reported by the firmware; used verbatim in selections
    pub index: String,
    pub ssid: String,
    pub vendor: String,
    pub bssid: String,
    pub channel: String,
    pub auth: String,
    /// dBm as text; the firmware does not guarantee a number here
    pub rssi: String,
    pub band: String,
}

impl NetworkRecord {
    pub fn rssi_dbm(&self) -> Option<i32> {
        self.rssi.trim().trim_end_matches("dBm").trim().parse().ok()
    }
}

/// A probe request sighting from `show_probes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub client_mac: Option<String>,
    /// Requested SSID, or the hidden placeholder
    pub ssid: String,
    /// Signal with unit, e.g. `-60dBm`
    pub rssi: Option<String>,
    pub timestamp: Option<String>,
}

impl ProbeRecord {
    pub fn rssi_dbm(&self) -> Option<i32> {
        self.rssi.as_deref()?.trim_end_matches("dBm").parse().ok()
    }
}

/// Coarse frame type of a sniffer result line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    Beacon,
    Probe,
    Data,
    Auth,
    Other,
}

/// One parsed row of `show_sniffer_results`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnifferPacket {
    pub packet_type: String,
    pub kind: PacketKind,
    pub src: String,
    pub dst: String,
    pub size: String,
    pub info: String,
}

/// Sniffer result lines; rows that are not packets are kept verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnifferReport {
    pub packets: Vec<SnifferPacket>,
    pub other_lines: Vec<String>,
}

/// One entry of the portal password log (`show_pass`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordLogEntry {
    pub timestamp: String,
    pub ssid: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasswordLog {
    pub entries: Vec<PasswordLogEntry>,
    pub other_lines: Vec<String>,
}

/// Portal template found on the SD card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlFile {
    pub number: String,
    pub name: String,
    pub display: String,
}

/// Run state and counters of one feature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureState {
    pub running: bool,
    /// Unix seconds of the last start
    pub started_at: Option<u64>,
    /// Every non-empty line the listener consumed
    pub lines_seen: u64,
    /// Last packet total reported by the sniffer
    pub packets: u64,
    pub forms_submitted: u32,
    pub clients: u32,
    pub captured: Vec<String>,
    pub last_submitted: Option<String>,
    pub last_notice: Option<String>,
    pub last_error: Option<String>,
    pub last_status: Option<String>,
    /// SSID impersonated by the evil twin
    pub target_ssid: Option<String>,
}

impl FeatureState {
    /// Clear counters ahead of a (re)start
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_packets(&mut self, count: u64) {
        self.packets = count;
    }

    /// Mutation table for captive portal events
    pub fn apply_portal_event(&mut self, event: PortalEvent) {
        match event {
            PortalEvent::ClientConnected => self.clients = self.clients.saturating_add(1),
            PortalEvent::ClientCount(count) => self.clients = count,
            PortalEvent::PasswordSubmitted(password) => {
                self.forms_submitted = self.forms_submitted.saturating_add(1);
                if !password.is_empty() {
                    self.last_submitted = Some(format!("Password: {password}"));
                }
            }
            PortalEvent::FormSubmitted(line) => {
                self.forms_submitted = self.forms_submitted.saturating_add(1);
                self.last_submitted = Some(line);
            }
            PortalEvent::DataSaved(line)
            | PortalEvent::ConnectionAttempt(line)
            | PortalEvent::CaptureSaved(line) => self.last_notice = Some(line),
            PortalEvent::CredentialCaptured(line) => self.captured.push(line),
            PortalEvent::Error(line) => self.last_error = Some(line),
            PortalEvent::Status(line) => self.last_status = Some(line),
        }
    }
}

/// Host-side view of the peripheral
#[derive(Debug, Clone)]
pub struct SessionState {
    features: BTreeMap<Feature, FeatureState>,
    /// Records of the most recent scan
    pub networks: Vec<NetworkRecord>,
    /// Whether the most recent scan saw its completion marker
    pub scan_completed: bool,
    /// Selection sent to the firmware, relative to `networks`
    pub selection: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            features: Feature::iter()
                .map(|feature| (feature, FeatureState::default()))
                .collect(),
            networks: Vec::new(),
            scan_completed: false,
            selection: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feature(&self, feature: Feature) -> &FeatureState {
        // every variant is inserted by Default and never removed
        &self.features[&feature]
    }

    pub fn features(&self) -> impl Iterator<Item = (Feature, &FeatureState)> {
        self.features.iter().map(|(feature, state)| (*feature, state))
    }

    pub fn feature_mut(&mut self, feature: Feature) -> &mut FeatureState {
        self.features.entry(feature).or_default()
    }

    pub fn is_running(&self, feature: Feature) -> bool {
        self.feature(feature).running
    }

    pub fn running_features(&self) -> Vec<Feature> {
        self.features
            .iter()
            .filter(|(_, state)| state.running)
            .map(|(feature, _)| *feature)
            .collect()
    }

    /// Drop the previous scan before a new one; the selection refers to it
    pub fn clear_networks(&mut self) {
        self.networks.clear();
        self.scan_completed = false;
        self.selection = None;
    }

    pub fn has_networks(&self) -> bool {
        !self.networks.is_empty()
    }

    pub fn network_by_index(&self, index: &str) -> Option<&NetworkRecord> {
        self.networks.iter().find(|n| n.index == index)
    }
}
