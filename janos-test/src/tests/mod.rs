pub mod connection;
pub mod scan;
pub mod sniffer;
pub mod system;

use anyhow::Result;
use janos_core::SessionManager;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Test context passed to all test functions
pub struct TestContext<'a> {
    pub session: &'a mut SessionManager,
    #[allow(dead_code)]
    pub verbose: bool,
    /// Host for the ping check; the check is skipped without one
    pub ping_host: Option<&'a str>,
}

impl<'a> TestContext<'a> {
    pub fn new(
        session: &'a mut SessionManager,
        verbose: bool,
        ping_host: Option<&'a str>,
    ) -> Self {
        Self {
            session,
            verbose,
            ping_host,
        }
    }
}

/// A single test definition
pub struct Test {
    pub name: &'static str,
    #[allow(dead_code)]
    pub description: &'static str,
    pub run_fn: Box<
        dyn for<'a> Fn(&'a mut TestContext<'_>) -> Pin<Box<dyn Future<Output = Result<Value>> + 'a>>
            + Send
            + Sync,
    >,
}

/// Test categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCategory {
    Connection,
    Scan,
    Sniffer,
    System,
}

impl TestCategory {
    pub const ALL: [TestCategory; 4] = [Self::Connection, Self::Scan, Self::Sniffer, Self::System];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "connection" | "link" => Some(Self::Connection),
            "scan" | "wifi" => Some(Self::Scan),
            "sniffer" | "sniff" => Some(Self::Sniffer),
            "system" | "sd" => Some(Self::System),
            _ => None,
        }
    }

    pub fn get_tests(&self) -> Vec<Test> {
        match self {
            Self::Connection => connection::get_tests(),
            Self::Scan => scan::get_tests(),
            Self::Sniffer => sniffer::get_tests(),
            Self::System => system::get_tests(),
        }
    }
}

/// Helper macro for defining tests
#[macro_export]
macro_rules! define_test {
    ($name:expr, $desc:expr, $func:expr) => {
        Test {
            name: $name,
            description: $desc,
            run_fn: Box::new(move |ctx| Box::pin($func(ctx))),
        }
    };
}
