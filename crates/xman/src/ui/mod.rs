//! Terminal output
//!
//! Operator-facing status lines, the current-profile banner and tables go
//! to stdout through these helpers. Diagnostics go through `tracing`.

pub mod prompt;
pub mod spinner;

use console::style;
use xman_core::config::ToolProfile;

const RULE_WIDTH: usize = 60;

/// In-progress step, e.g. "Running database creation script..."
pub fn emphasis(message: impl AsRef<str>) {
    println!("{}", style(message.as_ref()).yellow());
}

pub fn success(message: impl AsRef<str>) {
    println!("{}\n", style(message.as_ref()).green());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{}\n", style(message.as_ref()).red());
}

pub fn plain(message: impl AsRef<str>) {
    println!("{}", message.as_ref());
}

fn rule(title: &str) {
    let fill = RULE_WIDTH.saturating_sub(title.chars().count() + 1);
    if title.is_empty() {
        println!("{}", style("─".repeat(RULE_WIDTH)).dim());
    } else {
        println!("{} {}", title, style("─".repeat(fill)).dim());
    }
}

/// Banner naming the profile a command works on.
pub fn print_profile(profile: Option<&ToolProfile>) {
    let name = profile
        .and_then(|p| p.project_name.as_deref())
        .unwrap_or("None");
    let path = profile
        .and_then(|p| p.working_directory.as_deref())
        .unwrap_or("None");

    rule("Current profile:");
    println!("Name: {}", style(name).cyan());
    println!("Path: {}", style(path).cyan());
    rule("");
    println!();
}

/// Render rows as a left-aligned table with a header row.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(headers.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

/// Cut long values shown as hints next to a choice.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        format!("{}...", value.chars().take(max).collect::<String>())
    } else {
        value.to_string()
    }
}
