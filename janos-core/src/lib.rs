//! Core library for janos
//!
//! This crate drives a JanOS wireless peripheral over its serial console:
//! paced line I/O, bounded command/response exchanges, background listeners
//! for running features, and classifiers for the firmware's free-form output.

pub mod attack;
pub mod channel;
pub mod classify;
pub mod config;
pub mod error;
pub mod listener;
pub mod portal;
pub mod scan;
pub mod session;
pub mod sniffer;
pub mod state;
pub mod system;
pub mod transport;

// Re-export commonly used types
pub use anyhow::Result;
pub use config::EngineConfig;
pub use error::SessionError;
pub use session::SessionManager;
pub use state::{Feature, FeatureState, SessionState};
