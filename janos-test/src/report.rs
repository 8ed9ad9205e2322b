use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub category: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Summary statistics for a test category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Board information collected during testing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub port: String,
    pub baud_rate: Option<u32>,
    pub networks_seen: Option<u64>,
    pub packets_captured: Option<u64>,
    pub sd_card_lines: Option<u64>,
}

/// Complete test report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub test_id: String,
    pub timestamp: DateTime<Utc>,
    pub device_info: DeviceInfo,
    pub tests_run: usize,
    pub tests_passed: usize,
    pub tests_failed: usize,
    pub duration_ms: u64,
    pub test_results: Vec<TestResult>,
    pub category_stats: Vec<CategoryStats>,
    pub recommendations: Vec<String>,
}

impl TestReport {
    pub fn new(device_port: String) -> Self {
        Self {
            test_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            device_info: DeviceInfo {
                port: device_port,
                baud_rate: None,
                networks_seen: None,
                packets_captured: None,
                sd_card_lines: None,
            },
            tests_run: 0,
            tests_passed: 0,
            tests_failed: 0,
            duration_ms: 0,
            test_results: Vec::new(),
            category_stats: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn add_test_result(&mut self, result: TestResult) {
        self.tests_run += 1;
        if result.passed {
            self.tests_passed += 1;
        } else {
            self.tests_failed += 1;
        }
        self.test_results.push(result);
    }

    /// Pick board facts out of passing test details
    pub fn note_device_details(&mut self, result: &TestResult) {
        if !result.passed {
            return;
        }
        let details = &result.details;
        let info = &mut self.device_info;
        match result.name.as_str() {
            "Link Open" => {
                info.baud_rate = details["baud_rate"].as_u64().map(|baud| baud as u32)
            }
            "Network Scan" => info.networks_seen = details["networks"].as_u64(),
            "Capture" => info.packets_captured = details["packets"].as_u64(),
            "SD Card Listing" => info.sd_card_lines = details["lines"].as_u64(),
            _ => {}
        }
    }

    pub fn calculate_stats(&mut self) {
        let mut category_map: std::collections::BTreeMap<String, CategoryStats> =
            std::collections::BTreeMap::new();

        for result in &self.test_results {
            let stat = category_map
                .entry(result.category.clone())
                .or_insert_with(|| CategoryStats {
                    category: result.category.clone(),
                    total: 0,
                    passed: 0,
                    failed: 0,
                    duration_ms: 0,
                });

            stat.total += 1;
            stat.duration_ms += result.duration_ms;

            if result.passed {
                stat.passed += 1;
            } else {
                stat.failed += 1;
            }
        }

        self.category_stats = category_map.into_values().collect();

        self.generate_recommendations();
    }

    fn generate_recommendations(&mut self) {
        self.recommendations.clear();

        if self.tests_failed > self.tests_passed {
            self.recommendations.push(
                "Majority of tests failed. Check the baud rate and reset the board.".to_string(),
            );
        }

        for stat in &self.category_stats {
            if stat.failed == 0 {
                continue;
            }
            let hint = match stat.category.as_str() {
                "Connection" => "Connection tests are failing. Check the USB cable and that no other program holds the port.",
                "Scan" => "Scan tests are failing. Try a longer --scan-timeout or move closer to access points.",
                "Sniffer" => "Sniffer tests are failing. Update the JanOS firmware; older builds lack sniffer commands.",
                "System" => "System tests are failing. Make sure the SD card is inserted and formatted FAT32.",
                _ => continue,
            };
            self.recommendations.push(hint.to_string());
        }
    }

    pub fn print_summary(&self) {
        use colored::*;
        use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

        let rule = "═══════════════════════════════════════════════════════".bold();
        println!("\n{rule}");
        println!(
            "{title}",
            title = "                   TEST REPORT SUMMARY                  "
                .bold()
                .cyan()
        );
        println!("{rule}");

        let info = &self.device_info;
        println!("\n{section}", section = "Board:".bold());
        println!("  Port: {port}", port = info.port);
        let facts = [
            ("Baud rate", info.baud_rate.map(u64::from)),
            ("Networks seen", info.networks_seen),
            ("Packets captured", info.packets_captured),
            ("SD card entries", info.sd_card_lines),
        ];
        for (label, value) in facts {
            if let Some(value) = value {
                println!("  {label}: {value}");
            }
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["Category", "Passed", "Failed", "Time"]);
        for stat in &self.category_stats {
            let failed = Cell::new(stat.failed).fg(if stat.failed == 0 {
                Color::Green
            } else {
                Color::Red
            });
            table.add_row(vec![
                Cell::new(&stat.category),
                Cell::new(format!("{}/{}", stat.passed, stat.total)),
                failed,
                Cell::new(format!("{}ms", stat.duration_ms)),
            ]);
        }
        println!("\n{table}");

        let percent = self.tests_passed * 100 / self.tests_run.max(1);
        let verdict = format!(
            "{passed}/{total} passed ({percent}%) in {seconds:.1}s",
            passed = self.tests_passed,
            total = self.tests_run,
            seconds = self.duration_ms as f64 / 1000.0
        );
        println!(
            "  {}",
            if self.tests_failed == 0 {
                verdict.green()
            } else {
                verdict.red()
            }
        );

        for failed in self.test_results.iter().filter(|result| !result.passed) {
            println!(
                "  {cross} {category}/{name}: {error}",
                cross = "✗".red(),
                category = failed.category,
                name = failed.name,
                error = failed.error.as_deref().unwrap_or("unknown error")
            );
        }

        if !self.recommendations.is_empty() {
            println!("\n{section}", section = "Recommendations:".bold().yellow());
            for rec in &self.recommendations {
                println!("  • {rec}");
            }
        }

        println!("\n{rule}");
    }
}
