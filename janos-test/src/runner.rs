use anyhow::{Result, bail};
use chrono::Utc;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use janos_core::{EngineConfig, SessionManager};
use std::time::Instant;
use tracing::warn;

use crate::report::{TestReport, TestResult};
use crate::tests::{Test, TestCategory, TestContext};

/// Runs test categories in order against one open session
pub struct TestRunner {
    session: SessionManager,
    ping_host: Option<String>,
    report: TestReport,
    verbose: bool,
    non_interactive: bool,
    categories: Vec<TestCategory>,
}

impl TestRunner {
    pub fn new(
        port: String,
        config: EngineConfig,
        ping_host: Option<String>,
        verbose: bool,
        non_interactive: bool,
    ) -> Result<Self> {
        eprintln!(
            "{arrow} Opening {port} at {baud} baud...",
            arrow = "→".cyan(),
            port = port.bold(),
            baud = config.baud_rate
        );

        let session = SessionManager::open(&port, config)?;
        eprintln!("{check} Link open", check = "✓".green());

        Ok(Self {
            session,
            ping_host,
            report: TestReport::new(port),
            verbose,
            non_interactive,
            categories: TestCategory::ALL.to_vec(),
        })
    }

    /// Restrict the run to the named categories; unknown names are ignored
    pub async fn run_specific_tests(&mut self, names: Vec<String>) -> Result<TestReport> {
        self.categories = names
            .iter()
            .filter_map(|name| TestCategory::from_str(name))
            .collect();
        if self.categories.is_empty() {
            bail!("No valid test categories specified (connection, scan, sniffer, system)");
        }
        self.run_all_tests().await
    }

    pub async fn run_all_tests(&mut self) -> Result<TestReport> {
        let started = Instant::now();
        let planned: Vec<(TestCategory, Vec<Test>)> = self
            .categories
            .iter()
            .map(|category| (*category, category.get_tests()))
            .collect();
        let total: usize = planned.iter().map(|(_, tests)| tests.len()).sum();

        eprintln!(
            "\n{message}",
            message = format!("Running {total} hardware tests...").bold().cyan()
        );
        let progress = self.progress_bar(total);

        for (category, tests) in planned {
            if self.is_plain() {
                eprintln!("\n{arrow} {category:?}", arrow = "→".blue());
            }
            for test in tests {
                progress.set_message(format!("{category:?}: {}", test.name));
                let result = self.run_test(category, &test).await;
                if self.is_plain() {
                    print_result(&result);
                }
                self.report.note_device_details(&result);
                self.report.add_test_result(result);
                progress.inc(1);
            }
        }

        progress.finish_and_clear();
        self.report.duration_ms = started.elapsed().as_millis() as u64;
        self.report.calculate_stats();
        Ok(self.report.clone())
    }

    /// Stop anything still running and close the link
    pub async fn shutdown(mut self) {
        self.session.shutdown().await;
    }

    async fn run_test(&mut self, category: TestCategory, test: &Test) -> TestResult {
        let started = Instant::now();
        let mut context = TestContext::new(
            &mut self.session,
            self.verbose,
            self.ping_host.as_deref(),
        );
        let outcome = (test.run_fn)(&mut context).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        // A failed test can leave its feature running on the board
        let leftover = self.session.stop_all().await;
        if !leftover.is_empty() {
            warn!("Stopped features left running by {}: {leftover:?}", test.name);
        }

        let (details, error) = match outcome {
            Ok(details) => (details, None),
            Err(e) => {
                let message = format!("{e:#}");
                (serde_json::json!({ "error": &message }), Some(message))
            }
        };

        TestResult {
            name: test.name.to_string(),
            category: format!("{category:?}"),
            passed: error.is_none(),
            duration_ms,
            error,
            details,
            timestamp: Utc::now(),
        }
    }

    fn is_plain(&self) -> bool {
        self.verbose || self.non_interactive
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if self.non_interactive {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

fn print_result(result: &TestResult) {
    match &result.error {
        None => eprintln!(
            "  {check} {name} ({duration}ms)",
            check = "✓".green(),
            name = result.name,
            duration = result.duration_ms
        ),
        Some(error) => eprintln!(
            "  {cross} {name} - {error} ({duration}ms)",
            cross = "✗".red(),
            name = result.name,
            error = error.red(),
            duration = result.duration_ms
        ),
    }
}
