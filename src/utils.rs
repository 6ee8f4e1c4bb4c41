use colored::Colorize;
use std::io::{self, Write};

use crate::reclaim::summary::EntryOutcome;

/// Truncate a long opaque id for table display
pub fn format_id(id: &str) -> String {
    if id.chars().count() <= 12 {
        id.to_string()
    } else {
        let chars: Vec<char> = id.chars().collect();
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// The `YYYY-MM-DD` part of a QRS timestamp, or a placeholder
pub fn format_last_used(last_used: Option<&str>) -> String {
    match last_used {
        Some(value) => value.get(..10).unwrap_or(value).to_string(),
        None => "never".to_string(),
    }
}

/// Colored outcome label for terminal output
pub fn format_outcome(outcome: &EntryOutcome) -> String {
    let label = outcome.label();
    match outcome {
        EntryOutcome::Deleted { .. } => label.green().to_string(),
        EntryOutcome::WouldDelete => label.yellow().to_string(),
        EntryOutcome::Retained | EntryOutcome::Skipped => label.dimmed().to_string(),
        EntryOutcome::Failed(_) => label.red().to_string(),
    }
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> io::Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_id() {
        assert_eq!(format_id("short-id"), "short-id");
        assert_eq!(
            format_id("3f2504e0-4f89-11d3-9a0c-0305e82c3301"),
            "3f2504...2c3301"
        );
    }

    #[test]
    fn test_format_last_used() {
        assert_eq!(format_last_used(Some("2024-03-02T10:00:00.000Z")), "2024-03-02");
        assert_eq!(format_last_used(Some("2024")), "2024");
        assert_eq!(format_last_used(None), "never");
    }
}
