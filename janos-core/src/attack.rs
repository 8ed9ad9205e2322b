use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::classify::{PortalEvent, classify_attack_line, classify_handshake_line};
use crate::error::SessionError;
use crate::session::{AckPolicy, FeatureLaunch, SessionManager};
use crate::state::{Feature, FeatureState};

/// Flooding and capture modes driven by the current network selection
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttackKind {
    Deauth,
    Blackout,
    SaeOverflow,
    Handshake,
}

impl AttackKind {
    pub fn feature(self) -> Feature {
        match self {
            AttackKind::Deauth => Feature::Deauth,
            AttackKind::Blackout => Feature::Blackout,
            AttackKind::SaeOverflow => Feature::SaeOverflow,
            AttackKind::Handshake => Feature::Handshake,
        }
    }

    pub fn command(self) -> &'static str {
        match self {
            AttackKind::Deauth => "start_deauth",
            AttackKind::Blackout => "start_blackout",
            AttackKind::SaeOverflow => "sae_overflow",
            AttackKind::Handshake => "start_handshake",
        }
    }

    fn classifier(self) -> fn(&str) -> Option<PortalEvent> {
        match self {
            AttackKind::Handshake => classify_handshake_line,
            _ => classify_attack_line,
        }
    }
}

/// How the firmware picks targets for a started attack
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "selection", rename_all = "kebab-case")]
pub enum Targeting {
    Selected(String),
    /// Handshake capture without a selection cycles through every network
    AllNetworks,
    /// Blackout and SAE overflow pick their own targets
    Firmware,
}

pub async fn start(session: &mut SessionManager, kind: AttackKind) -> Result<Targeting> {
    let selection = session.get_state_ref().lock().await.selection.clone();

    let targeting = match (kind, selection) {
        (AttackKind::Deauth, None) => return Err(SessionError::NoSelection.into()),
        (AttackKind::Deauth | AttackKind::Handshake, Some(selection)) => {
            Targeting::Selected(selection)
        }
        (AttackKind::Handshake, None) => Targeting::AllNetworks,
        _ => Targeting::Firmware,
    };

    session
        .start_feature(FeatureLaunch {
            feature: kind.feature(),
            command: kind.command().to_string(),
            ack: AckPolicy::None,
            classify: kind.classifier(),
            apply: FeatureState::apply_portal_event,
        })
        .await?;

    info!("{} running ({:?})", kind, targeting);
    Ok(targeting)
}
