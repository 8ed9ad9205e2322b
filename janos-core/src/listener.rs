use crate::state::{Feature, FeatureState, SessionState};
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

/// Background task streaming lines of one running feature into its state.
///
/// The classifier turns a line into an optional event, the mutator applies the
/// event to the feature's [`FeatureState`]. Cancellation is checked once per
/// iteration, so the idle interval bounds how long a stop takes. Dropping the
/// listener raises the signal too.
pub struct TelemetryListener {
    feature: Feature,
    token: CancellationToken,
    handle: JoinHandle<u64>,
    _cancel_on_drop: DropGuard,
}

impl TelemetryListener {
    pub fn spawn<E, C, M>(
        feature: Feature,
        transport: Arc<Transport>,
        state: Arc<Mutex<SessionState>>,
        idle: Duration,
        classify: C,
        apply: M,
    ) -> Self
    where
        E: Send + 'static,
        C: Fn(&str) -> Option<E> + Send + 'static,
        M: Fn(&mut FeatureState, E) + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            debug!("{} listener started", feature);
            let mut consumed = 0u64;

            while !task_token.is_cancelled() {
                if !transport.has_data().await {
                    sleep(idle).await;
                    continue;
                }

                let Some(line) = transport.read_line(idle).await else {
                    continue;
                };
                if line.is_empty() {
                    continue;
                }

                consumed += 1;
                let event = classify(&line);
                let mut state = state.lock().await;
                let entry = state.feature_mut(feature);
                entry.lines_seen += 1;
                if let Some(event) = event {
                    apply(entry, event);
                }
            }

            debug!("{} listener exiting after {} lines", feature, consumed);
            consumed
        });

        Self {
            feature,
            _cancel_on_drop: token.clone().drop_guard(),
            token,
            handle,
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Raise the stop signal without waiting
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task and wait up to `grace` for it to exit.
    ///
    /// Returns `false` when the task was still running at the deadline; it is
    /// detached and left to observe the signal on its own.
    pub async fn stop(self, grace: Duration) -> bool {
        let Self {
            feature,
            token,
            handle,
            ..
        } = self;
        token.cancel();
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("{} listener ended abnormally: {}", feature, e);
                true
            }
            Err(_) => {
                warn!(
                    "{} listener did not exit within {:?}, detaching it",
                    feature, grace
                );
                false
            }
        }
    }
}
