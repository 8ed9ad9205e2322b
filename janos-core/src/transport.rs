//! Serial link ownership and paced line I/O

use crate::config::EngineConfig;
use crate::error::SessionError;
use anyhow::Result;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Raw byte access to the peripheral.
///
/// Implemented for real serial ports; tests substitute a scripted link.
pub trait SerialLink: Send {
    /// Bytes that can be read without blocking
    fn available(&mut self) -> io::Result<usize>;
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()>;
    fn flush_output(&mut self) -> io::Result<()>;
}

impl SerialLink for Box<dyn SerialPort> {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.write_all(data)
    }

    fn flush_output(&mut self) -> io::Result<()> {
        self.flush()
    }
}

struct LinkState {
    link: Option<Box<dyn SerialLink>>,
    /// Bytes read but not yet terminated by a newline
    pending: Vec<u8>,
}

enum Pull {
    Line(String),
    Waiting,
    Closed,
}

/// Exclusive owner of the serial device.
///
/// Every method takes `&self`; the link sits behind a mutex so a listener task
/// and the foreground can share one `Arc<Transport>`. Keeping them from reading
/// at the same time is the session's job.
pub struct Transport {
    device: String,
    terminator: String,
    write_settle: Duration,
    read_poll: Duration,
    state: Mutex<LinkState>,
}

impl Transport {
    /// Open the device at 8N1 and discard whatever the driver buffered.
    ///
    /// This is the only fatal failure of a session.
    pub fn open(device: &str, config: &EngineConfig) -> Result<Self> {
        if cfg!(unix) && !Path::new(device).exists() {
            return Err(SessionError::DeviceNotFound(device.to_string()).into());
        }

        let port = serialport::new(device, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.os_read_timeout)
            .open()
            .map_err(|e| open_error(device, e))?;

        if let Err(e) = port.clear(ClearBuffer::All) {
            warn!("Could not clear buffers of {}: {}", device, e);
        }

        info!("Opened {} at {} baud", device, config.baud_rate);
        Ok(Self::from_link(device, Box::new(port), config))
    }

    /// Wrap an already open link
    pub fn from_link(device: &str, link: Box<dyn SerialLink>, config: &EngineConfig) -> Self {
        Self {
            device: device.to_string(),
            terminator: config.line_terminator.clone(),
            write_settle: config.write_settle,
            read_poll: config.read_poll,
            state: Mutex::new(LinkState {
                link: Some(link),
                pending: Vec::new(),
            }),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.link.is_some()
    }

    /// Write one command line, then hold off for the settle delay.
    ///
    /// Failures are logged and reported as `false`; the settle delay is skipped.
    pub async fn write_line(&self, line: &str) -> bool {
        let payload = format!("{line}{}", self.terminator);

        let result = {
            let mut state = self.state.lock().await;
            match state.link.as_mut() {
                Some(link) => link
                    .write_bytes(payload.as_bytes())
                    .and_then(|()| link.flush_output()),
                None => Err(io::Error::new(io::ErrorKind::NotConnected, "link is closed")),
            }
        };

        match result {
            Ok(()) => {
                debug!("> {}", line);
                sleep(self.write_settle).await;
                true
            }
            Err(e) => {
                warn!("Failed to send '{}' to {}: {}", line, self.device, e);
                false
            }
        }
    }

    /// Non-blocking check for buffered or pending input
    pub async fn has_data(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.pending.is_empty() {
            return true;
        }
        match state.link.as_mut().map(|link| link.available()) {
            Some(Ok(count)) => count > 0,
            Some(Err(e)) => {
                debug!("Polling {} failed: {}", self.device, e);
                false
            }
            None => false,
        }
    }

    /// Wait up to `max_wait` for one complete line.
    ///
    /// Invalid UTF-8 is replaced, surrounding whitespace (including `\r`) is
    /// trimmed. Returns `None` on timeout or when the link is closed; a partial
    /// line stays buffered for the next call.
    pub async fn read_line(&self, max_wait: Duration) -> Option<String> {
        let deadline = Instant::now() + max_wait;
        loop {
            match self.pull_line().await {
                Pull::Line(line) => {
                    debug!("< {}", line);
                    return Some(line);
                }
                Pull::Closed => return None,
                Pull::Waiting => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            sleep(self.read_poll.min(deadline - now)).await;
        }
    }

    async fn pull_line(&self) -> Pull {
        let mut guard = self.state.lock().await;
        let LinkState { link, pending } = &mut *guard;

        if let Some(line) = take_line(pending) {
            return Pull::Line(line);
        }

        let Some(link) = link.as_mut() else {
            return Pull::Closed;
        };

        let available = match link.available() {
            Ok(count) => count,
            Err(e) => {
                debug!("Polling {} failed: {}", self.device, e);
                return Pull::Waiting;
            }
        };
        if available == 0 {
            return Pull::Waiting;
        }

        let mut buf = vec![0u8; available];
        match link.read_chunk(&mut buf) {
            Ok(read) => pending.extend_from_slice(&buf[..read]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                warn!("Read from {} failed: {}", self.device, e);
                return Pull::Waiting;
            }
        }

        take_line(pending).map_or(Pull::Waiting, Pull::Line)
    }

    /// Release the OS handle. Returns whether this call closed it.
    pub async fn close(&self) -> bool {
        let mut state = self.state.lock().await;
        state.pending.clear();
        match state.link.take() {
            Some(_) => {
                info!("Closed {}", self.device);
                true
            }
            None => false,
        }
    }
}

fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let raw: Vec<u8> = pending.drain(..=end).collect();
    Some(String::from_utf8_lossy(&raw).trim().to_string())
}

fn open_error(device: &str, err: serialport::Error) -> anyhow::Error {
    match err.kind() {
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            SessionError::PermissionDenied(device.to_string()).into()
        }
        serialport::ErrorKind::NoDevice => SessionError::DeviceNotFound(device.to_string()).into(),
        _ => SessionError::OpenFailed {
            path: device.to_string(),
            source: err,
        }
        .into(),
    }
}
