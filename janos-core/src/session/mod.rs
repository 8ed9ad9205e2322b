mod manager;

pub use manager::{AckPolicy, FeatureLaunch, SessionManager, StartReport};
