use crate::state::Feature;
use thiserror::Error;

/// Engine conditions a caller may want to branch on.
///
/// These travel inside `anyhow::Error`; use `err.downcast_ref::<SessionError>()`
/// to inspect them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The serial device path does not exist
    #[error("Device {0} does not exist")]
    DeviceNotFound(String),

    /// The serial device exists but cannot be opened for reading and writing
    #[error("No read/write access to '{0}' (try adding your user to the dialout group)")]
    PermissionDenied(String),

    /// The OS refused to configure the serial port
    #[error("Error opening serial port {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// Another feature already owns the link
    #[error("Cannot start {requested}: {running} is running")]
    FeatureBusy { requested: Feature, running: Feature },

    /// A foreground exchange would race the running feature's listener
    #[error("{0} is running; stop it first")]
    LinkBusy(Feature),

    #[error("No networks scanned yet. Run a scan first")]
    NoScanResults,

    #[error("Invalid selection '{0}'. Use numbers separated by spaces or 'all'")]
    InvalidSelection(String),

    #[error("No networks selected")]
    NoSelection,

    /// The peripheral answered the start command with an error line
    #[error("{feature} failed to start: {line}")]
    StartRejected { feature: Feature, line: String },

    /// The peripheral never confirmed the start command
    #[error("{0} did not confirm startup")]
    NoAcknowledgement(Feature),
}
