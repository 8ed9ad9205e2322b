use comfy_table::{Cell, Color, Table};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Print `data` as pretty JSON.
///
/// Handlers draw their own tables in table mode, so both formats print JSON
/// here.
pub fn print_output<T: Serialize>(data: T, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Table => {
            if let Ok(json) = serde_json::to_string_pretty(&data) {
                println!("{}", json);
            }
        }
    }
}

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

/// Signal strength cell: green above -50 dBm, yellow above -70, red below
pub fn rssi_cell(text: &str, dbm: Option<i32>) -> Cell {
    let color = match dbm {
        Some(dbm) if dbm < -70 => Color::Red,
        Some(dbm) if dbm < -50 => Color::Yellow,
        Some(_) => Color::Green,
        None => Color::DarkGrey,
    };
    Cell::new(text).fg(color)
}

/// Cut `text` to `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
