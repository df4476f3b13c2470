//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or JSON. Text writers take
//! any [`Write`] so they can be exercised against a buffer.
//!
//! Submodules:
//! - [`color`]: semantic colors and icons
//! - [`tree`]: dependency tree rendering

pub mod color;
pub mod tree;

use crate::domain::{BlockedIssue, DependencyEdge, Event, Issue};
use crate::import::{ImportReport, ParsedDocument};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, success, warning};
pub use tree::write_dependency_tree;

use color::{bold, colored_status_icon, colored_type_icon, colorize_id, colorize_priority, colorize_status, dimmed};

/// Output format selected by `--json`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Settings that control text rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Use ASCII-only icons and connectors
    pub use_ascii: bool,
    /// Emit ANSI colors
    pub use_colors: bool,
}

impl OutputConfig {
    /// Read the configuration from the environment.
    ///
    /// - `TRELLIS_ASCII`: "1" or "true" for ASCII-only icons
    /// - `NO_COLOR`: any value disables colors
    /// - `TRELLIS_COLOR`: "0" or "false" disables colors
    pub fn from_env() -> Self {
        let use_ascii = match env::var("TRELLIS_ASCII") {
            Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Ok(v) if v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false") => false,
            Ok(v) => {
                tracing::warn!(
                    env_var = "TRELLIS_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            Err(_) => false,
        };

        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("TRELLIS_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Print a value as pretty JSON on stdout
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(io::Error::other)?;
    writeln!(handle)
}

/// Run a text writer against locked stdout with the environment's config
///
/// # Errors
///
/// Returns the writer's IO error.
pub fn print_text<F>(write: F) -> io::Result<()>
where
    F: FnOnce(&mut io::StdoutLock<'static>, &OutputConfig) -> io::Result<()>,
{
    let config = OutputConfig::from_env();
    let mut handle = io::stdout().lock();
    write(&mut handle, &config)
}

/// `○ ◇ tr-a1b2 P1 Title`
pub fn write_issue_line<W: Write>(w: &mut W, issue: &Issue, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {} {}",
        colored_status_icon(issue.status, config),
        colored_type_icon(issue.issue_type, config),
        colorize_id(issue.id.as_str(), config),
        colorize_priority(issue.priority, config),
        issue.title
    )
}

/// One line per issue, or a note when there are none
pub fn write_issue_list<W: Write>(
    w: &mut W,
    issues: &[Issue],
    empty_message: &str,
    config: &OutputConfig,
) -> io::Result<()> {
    if issues.is_empty() {
        return writeln!(w, "{}", dimmed(empty_message, config));
    }
    for issue in issues {
        write_issue_line(w, issue, config)?;
    }
    Ok(())
}

/// Full view of an issue for `show`
pub fn write_issue_details<W: Write>(
    w: &mut W,
    issue: &Issue,
    dependencies: &[DependencyEdge],
    dependents: &[DependencyEdge],
    events: &[Event],
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        colorize_id(issue.id.as_str(), config),
        bold(&issue.title, config)
    )?;
    let field = |name: &str| dimmed(&format!("{name:<10}"), config);

    writeln!(w, "{} {}", field("Status:"), colorize_status(issue.status, config))?;
    writeln!(w, "{} {}", field("Type:"), issue.issue_type)?;
    writeln!(w, "{} {}", field("Priority:"), colorize_priority(issue.priority, config))?;
    if let Some(assignee) = &issue.assignee {
        writeln!(w, "{} {assignee}", field("Assignee:"))?;
    }
    if let Some(minutes) = issue.estimated_minutes {
        writeln!(w, "{} {minutes} min", field("Estimate:"))?;
    }
    if let Some(logical_id) = &issue.logical_id {
        writeln!(w, "{} {logical_id}", field("Imported:"))?;
    }
    writeln!(
        w,
        "{} {} by {}",
        field("Created:"),
        issue.created_at.format("%Y-%m-%d %H:%M"),
        issue.created_by
    )?;
    if let Some(closed_at) = issue.closed_at {
        writeln!(w, "{} {}", field("Closed:"), closed_at.format("%Y-%m-%d %H:%M"))?;
    }

    for (heading, body) in [
        ("Description", &issue.description),
        ("Design", &issue.design),
        ("Acceptance criteria", &issue.acceptance_criteria),
        ("Notes", &issue.notes),
    ] {
        if !body.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", bold(heading, config))?;
            writeln!(w, "{body}")?;
        }
    }

    if !dependencies.is_empty() {
        writeln!(w)?;
        writeln!(w, "{} ({})", bold("Depends on", config), dependencies.len())?;
        for edge in dependencies {
            writeln!(
                w,
                "  {} {}",
                colorize_id(edge.depends_on_id.as_str(), config),
                dimmed(&format!("({})", edge.dep_type), config)
            )?;
        }
    }
    if !dependents.is_empty() {
        writeln!(w)?;
        writeln!(w, "{} ({})", bold("Depended on by", config), dependents.len())?;
        for edge in dependents {
            writeln!(
                w,
                "  {} {}",
                colorize_id(edge.issue_id.as_str(), config),
                dimmed(&format!("({})", edge.dep_type), config)
            )?;
        }
    }

    if !events.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", bold("History", config))?;
        for event in events {
            write_event(w, event, config)?;
        }
    }
    Ok(())
}

fn write_event<W: Write>(w: &mut W, event: &Event, config: &OutputConfig) -> io::Result<()> {
    let change = match (&event.old_value, &event.new_value) {
        (Some(old), Some(new)) => format!(" {old} -> {new}"),
        (None, Some(new)) => format!(" {new}"),
        (Some(old), None) => format!(" {old}"),
        (None, None) => String::new(),
    };
    let comment = event
        .comment
        .as_deref()
        .map(|c| format!(": {c}"))
        .unwrap_or_default();
    writeln!(
        w,
        "  {} {} {}{change}{comment}",
        dimmed(&event.created_at.format("%Y-%m-%d %H:%M").to_string(), config),
        event.actor,
        event.kind
    )
}

/// One edge per line, showing the far end
pub fn write_edges<W: Write>(
    w: &mut W,
    edges: &[DependencyEdge],
    reverse: bool,
    config: &OutputConfig,
) -> io::Result<()> {
    if edges.is_empty() {
        let message = if reverse { "No dependents" } else { "No dependencies" };
        return writeln!(w, "{}", dimmed(message, config));
    }
    for edge in edges {
        let other = if reverse { &edge.issue_id } else { &edge.depends_on_id };
        writeln!(
            w,
            "{} {}",
            colorize_id(other.as_str(), config),
            dimmed(&format!("({})", edge.dep_type), config)
        )?;
    }
    Ok(())
}

/// Non-ready issues with what holds each one back
pub fn write_blocked<W: Write>(
    w: &mut W,
    blocked: &[BlockedIssue],
    config: &OutputConfig,
) -> io::Result<()> {
    if blocked.is_empty() {
        return writeln!(w, "{}", dimmed("No blocked issues", config));
    }
    for entry in blocked {
        write_issue_line(w, &entry.issue, config)?;
        for blocker in &entry.blockers {
            writeln!(
                w,
                "    {} {} {}",
                dimmed("blocked by", config),
                colorize_id(blocker.id.as_str(), config),
                blocker.title
            )?;
        }
        for child in &entry.open_children {
            writeln!(
                w,
                "    {} {} {}",
                dimmed("open child", config),
                colorize_id(child.id.as_str(), config),
                child.title
            )?;
        }
    }
    Ok(())
}

/// Chain from an issue to its nearest open blocker
pub fn write_blocking_path<W: Write>(
    w: &mut W,
    path: &[Issue],
    config: &OutputConfig,
) -> io::Result<()> {
    let Some((first, rest)) = path.split_first() else {
        return writeln!(w, "{}", success("Nothing open blocks this issue", config));
    };
    write_issue_line(w, first, config)?;
    let arrow = if config.use_ascii { "->" } else { "→" };
    for (depth, issue) in rest.iter().enumerate() {
        write!(w, "{}{} ", "  ".repeat(depth + 1), dimmed(arrow, config))?;
        write_issue_line(w, issue, config)?;
    }
    Ok(())
}

/// Errors and warnings of a parsed document, plus a summary line
pub fn write_parsed_document<W: Write>(
    w: &mut W,
    doc: &ParsedDocument,
    config: &OutputConfig,
) -> io::Result<()> {
    for err in &doc.errors {
        writeln!(w, "{} {err}", error("error:", config))?;
    }
    for warn in &doc.warnings {
        writeln!(w, "{} {warn}", warning("warning:", config))?;
    }
    if doc.is_valid() {
        writeln!(
            w,
            "{} {} item(s), {} warning(s)",
            success("valid:", config),
            doc.items.len(),
            doc.warnings.len()
        )
    } else {
        writeln!(
            w,
            "{} {} error(s), {} warning(s)",
            error("invalid:", config),
            doc.errors.len(),
            doc.warnings.len()
        )
    }
}

/// Summary of an import
pub fn write_import_report<W: Write>(
    w: &mut W,
    report: &ImportReport,
    config: &OutputConfig,
) -> io::Result<()> {
    for warn in &report.warnings {
        writeln!(w, "{} {warn}", warning("warning:", config))?;
    }
    writeln!(
        w,
        "{} {} created, {} updated, {} edge(s) added ({} logical id(s) processed)",
        success("Imported:", config),
        report.created,
        report.updated,
        report.edges_created,
        report.logical_ids_processed
    )
}
