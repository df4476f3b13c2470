//! Styling for terminal output.
//!
//! Every helper goes through [`paint`], which leaves text untouched when
//! colors are off. Statuses share one color between their label and icon:
//! open is white, in progress yellow, blocked red, closed green.

use crate::domain::{IssueStatus, IssueType};
use colored::{Color, ColoredString, Colorize};

use super::OutputConfig;

fn paint(text: &str, config: &OutputConfig, style: impl FnOnce(&str) -> ColoredString) -> String {
    if config.use_colors {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn status_color(status: IssueStatus) -> Color {
    match status {
        IssueStatus::Open => Color::White,
        IssueStatus::InProgress => Color::Yellow,
        IssueStatus::Blocked => Color::Red,
        IssueStatus::Closed => Color::Green,
    }
}

pub fn success(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.green())
}

pub fn error(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.red())
}

pub fn warning(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.yellow())
}

pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.dimmed())
}

pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.bold())
}

pub(crate) fn colorize_id(id: &str, config: &OutputConfig) -> String {
    paint(id, config, |t| t.cyan())
}

pub(crate) fn colorize_status(status: IssueStatus, config: &OutputConfig) -> String {
    paint(status.as_str(), config, |t| t.color(status_color(status)))
}

/// `P0` is bold red and `P1` yellow; lower priorities stay plain
pub(crate) fn colorize_priority(priority: u8, config: &OutputConfig) -> String {
    let label = format!("P{priority}");
    paint(&label, config, |t| match priority {
        0 => t.red().bold(),
        1 => t.yellow(),
        _ => t.normal(),
    })
}

pub(crate) fn colored_status_icon(status: IssueStatus, config: &OutputConfig) -> String {
    let (ascii, unicode) = match status {
        IssueStatus::Open => ("o", "○"),
        IssueStatus::InProgress => (">", "▶"),
        IssueStatus::Blocked => ("x", "✗"),
        IssueStatus::Closed => ("+", "✓"),
    };
    let icon = if config.use_ascii { ascii } else { unicode };
    paint(icon, config, |t| t.color(status_color(status)))
}

pub(crate) fn colored_type_icon(issue_type: IssueType, config: &OutputConfig) -> String {
    let (ascii, unicode) = match issue_type {
        IssueType::Epic => ("#", "◆"),
        IssueType::Feature => ("+", "★"),
        IssueType::Task => ("-", "◇"),
        IssueType::Bug => ("*", "●"),
        IssueType::Chore => (".", "○"),
    };
    let icon = if config.use_ascii { ascii } else { unicode };
    paint(icon, config, |t| match issue_type {
        IssueType::Epic => t.magenta().bold(),
        IssueType::Feature => t.green(),
        IssueType::Task => t.blue(),
        IssueType::Bug => t.red(),
        IssueType::Chore => t.dimmed(),
    })
}
