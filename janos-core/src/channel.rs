use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Lines gathered by a bounded collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    pub lines: Vec<String>,
    /// The sentinel ended the collection before its deadline
    pub sentinel_seen: bool,
}

/// Command/response exchanges over the shared transport.
///
/// A send and the following collect are related only by time: whatever
/// arrives inside the window is attributed to the exchange.
#[derive(Clone)]
pub struct CommandChannel {
    transport: Arc<Transport>,
}

impl CommandChannel {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Fire-and-forget; `false` when the write failed
    pub async fn send(&self, command: &str) -> bool {
        self.transport.write_line(command).await
    }

    /// Every non-empty line arriving before `window` elapses, in order
    pub async fn collect_for(&self, window: Duration) -> Vec<String> {
        self.collect_until(window, |_| false).await.lines
    }

    /// Like [`collect_for`](Self::collect_for), but stops right after a line
    /// accepted by `is_sentinel`. The sentinel line is included.
    pub async fn collect_until<F>(&self, window: Duration, is_sentinel: F) -> Collected
    where
        F: Fn(&str) -> bool,
    {
        let deadline = Instant::now() + window;
        let mut collected = Collected::default();

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            match self.transport.read_line(deadline - now).await {
                Some(line) if line.is_empty() => {}
                Some(line) => {
                    let done = is_sentinel(&line);
                    collected.lines.push(line);
                    if done {
                        collected.sentinel_seen = true;
                        break;
                    }
                }
                None => {
                    if !self.transport.is_open().await {
                        break;
                    }
                }
            }
        }

        debug!(
            "Collected {} lines (sentinel: {})",
            collected.lines.len(),
            collected.sentinel_seen
        );
        collected
    }
}
