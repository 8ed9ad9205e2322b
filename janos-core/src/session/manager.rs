use anyhow::{Result, bail};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::channel::CommandChannel;
use crate::classify::{Acknowledgement, classify_ack};
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::listener::TelemetryListener;
use crate::state::{Feature, FeatureState, SessionState};
use crate::transport::Transport;

/// Generic command that halts whatever mode the firmware is in
pub const STOP_COMMAND: &str = "stop";

/// What `start_feature` waits for after sending the start command
#[derive(Debug, Clone, Copy)]
pub enum AckPolicy {
    /// Start the listener right away
    None,
    /// Drain briefly; an error line rejects the start, a line containing one
    /// of these markers (lowercase) confirms it
    Require(&'static [&'static str]),
}

/// Everything needed to bring one feature up
pub struct FeatureLaunch<C, M> {
    pub feature: Feature,
    pub command: String,
    pub ack: AckPolicy,
    pub classify: C,
    pub apply: M,
}

#[derive(Debug, Clone)]
pub struct StartReport {
    pub feature: Feature,
    /// Confirmation line, when the start was acknowledged
    pub acknowledgement: Option<String>,
}

/// Owns the link and every feature's run state.
///
/// At most one feature runs at a time; foreground exchanges are refused while
/// a listener owns the link.
pub struct SessionManager {
    config: EngineConfig,
    transport: Arc<Transport>,
    channel: CommandChannel,
    state: Arc<Mutex<SessionState>>,
    listeners: HashMap<Feature, TelemetryListener>,
}

impl SessionManager {
    pub fn open(device: &str, config: EngineConfig) -> Result<Self> {
        let transport = Transport::open(device, &config)?;
        Ok(Self::with_transport(transport, config))
    }

    pub fn with_transport(transport: Transport, config: EngineConfig) -> Self {
        let transport = Arc::new(transport);
        Self {
            config,
            channel: CommandChannel::new(transport.clone()),
            transport,
            state: Arc::new(Mutex::new(SessionState::new())),
            listeners: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device(&self) -> &str {
        self.transport.device()
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    pub async fn is_open(&self) -> bool {
        self.transport.is_open().await
    }

    pub async fn send(&self, command: &str) -> bool {
        self.channel.send(command).await
    }

    pub async fn get_state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub fn get_state_ref(&self) -> Arc<Mutex<SessionState>> {
        self.state.clone()
    }

    pub async fn feature_state(&self, feature: Feature) -> FeatureState {
        self.state.lock().await.feature(feature).clone()
    }

    pub async fn running_features(&self) -> Vec<Feature> {
        self.state.lock().await.running_features()
    }

    /// Refuse to start `requested` while any feature runs
    pub async fn ensure_idle(&self, requested: Feature) -> Result<()> {
        if let Some(running) = self.running_features().await.first().copied() {
            return Err(SessionError::FeatureBusy { requested, running }.into());
        }
        Ok(())
    }

    /// Refuse a foreground collection while a listener reads the link
    pub async fn ensure_link_free(&self) -> Result<()> {
        if let Some(running) = self.running_features().await.first().copied() {
            return Err(SessionError::LinkBusy(running).into());
        }
        Ok(())
    }

    /// Send `command` and collect whatever arrives in `window`
    pub async fn exchange(&self, command: &str, window: Duration) -> Result<Vec<String>> {
        self.ensure_link_free().await?;
        if !self.channel.send(command).await {
            bail!("Failed to send '{}' to {}", command, self.device());
        }
        Ok(self.channel.collect_for(window).await)
    }

    /// Send the start command, optionally wait for its acknowledgement, reset
    /// the feature's counters and hand the link to a new listener.
    pub async fn start_feature<E, C, M>(&mut self, launch: FeatureLaunch<C, M>) -> Result<StartReport>
    where
        E: Send + 'static,
        C: Fn(&str) -> Option<E> + Send + 'static,
        M: Fn(&mut FeatureState, E) + Send + 'static,
    {
        let FeatureLaunch {
            feature,
            command,
            ack,
            classify,
            apply,
        } = launch;

        self.ensure_idle(feature).await?;
        info!("Starting {} ({})", feature, command);

        if !self.channel.send(&command).await {
            bail!("Failed to send '{}' to {}", command, self.device());
        }

        let acknowledgement = match ack {
            AckPolicy::None => None,
            AckPolicy::Require(markers) => {
                sleep(self.config.ack_settle).await;
                let lines = self.channel.collect_for(self.config.ack_window).await;
                Some(evaluate_ack(feature, &lines, markers)?)
            }
        };

        {
            let mut state = self.state.lock().await;
            let entry = state.feature_mut(feature);
            entry.reset();
            entry.running = true;
            entry.started_at = Some(unix_now());
            entry.last_status = acknowledgement.clone();
        }

        let listener = TelemetryListener::spawn(
            feature,
            self.transport.clone(),
            self.state.clone(),
            self.config.listener_idle,
            classify,
            apply,
        );
        self.listeners.insert(feature, listener);

        Ok(StartReport {
            feature,
            acknowledgement,
        })
    }

    /// Mark a feature that runs in the foreground (a scan) as started
    pub(crate) async fn begin_foreground(&self, feature: Feature) -> Result<()> {
        self.ensure_idle(feature).await?;
        let mut state = self.state.lock().await;
        let entry = state.feature_mut(feature);
        entry.reset();
        entry.running = true;
        entry.started_at = Some(unix_now());
        Ok(())
    }

    pub(crate) async fn end_foreground(&self, feature: Feature) {
        self.state.lock().await.feature_mut(feature).running = false;
    }

    /// Send `stop`, join the listener within the grace period and clear the
    /// running flag. Returns `false` when the feature was not running.
    pub async fn stop_feature(&mut self, feature: Feature) -> bool {
        if !self.state.lock().await.is_running(feature) {
            debug!("{} is not running", feature);
            return false;
        }

        info!("Stopping {}", feature);
        self.channel.send(STOP_COMMAND).await;

        if let Some(listener) = self.listeners.remove(&feature) {
            listener.stop(self.config.listener_grace).await;
        }

        self.state.lock().await.feature_mut(feature).running = false;
        true
    }

    /// Stop every running feature; a no-op when nothing runs
    pub async fn stop_all(&mut self) -> Vec<Feature> {
        let running = self.running_features().await;
        let mut stopped = Vec::with_capacity(running.len());
        for feature in running {
            if self.stop_feature(feature).await {
                stopped.push(feature);
            }
        }
        stopped
    }

    /// Stop everything and release the device; safe to call repeatedly
    pub async fn shutdown(&mut self) {
        let stopped = self.stop_all().await;
        if !stopped.is_empty() {
            info!("Stopped {} running feature(s)", stopped.len());
        }
        if !self.transport.close().await {
            debug!("{} already closed", self.device());
        }
    }
}

/// Any error line rejects the start, even after a success line
fn evaluate_ack(feature: Feature, lines: &[String], markers: &[&str]) -> Result<String> {
    let mut confirmed = None;
    for line in lines {
        match classify_ack(line, markers) {
            Some(Acknowledgement::Failed(line)) => {
                return Err(SessionError::StartRejected { feature, line }.into());
            }
            Some(Acknowledgement::Started(line)) => {
                confirmed.get_or_insert(line);
            }
            None => {}
        }
    }
    confirmed.ok_or_else(|| SessionError::NoAcknowledgement(feature).into())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
