//! Output formatting utilities for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

/// Format a count with thousands separators: 125430 -> "125,430"
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);
    table
}

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = new_table(headers);
    for row in rows {
        table.add_row(row);
    }
    println!("{}", table);
}

/// Print a table with custom column colors
pub fn print_table_colored(headers: &[&str], rows: Vec<Vec<(String, Option<Color>)>>) {
    let mut table = new_table(headers);
    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .map(|(text, color)| match color {
                Some(c) => Cell::new(text).fg(c),
                None => Cell::new(text),
            })
            .collect();
        table.add_row(cells);
    }
    println!("{}", table);
}

/// Color for status words used across dashboards
pub fn status_color(status: &str) -> Option<Color> {
    match status {
        "authentic" | "verified" | "active" | "completed" => Some(Color::Green),
        "counterfeit" | "high" => Some(Color::Red),
        "suspicious" | "medium" | "current" => Some(Color::Yellow),
        _ => None,
    }
}

pub fn plain(text: impl Into<String>) -> (String, Option<Color>) {
    (text.into(), None)
}

pub fn status(text: &str) -> (String, Option<Color>) {
    (text.to_string(), status_color(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(125_430), "125,430");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_status_color() {
        assert_eq!(status_color("authentic"), Some(Color::Green));
        assert_eq!(status_color("counterfeit"), Some(Color::Red));
        assert_eq!(status_color("Store A"), None);
    }
}
