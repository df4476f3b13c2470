//! Outline and content section parsing.
//!
//! Parsing never fails: every problem becomes an [`ImportError`] or an
//! [`ImportWarning`] on the returned document.

use super::validate::validate;
use super::{
    CONTENT_SECTION, ImportError, ImportWarning, ParsedDocument, ParsedItem, STRUCTURE_SECTION,
};
use crate::domain::{DEFAULT_PRIORITY, IssueType, MAX_PRIORITY};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `- [logical_id] Title, key=value, ...`
static OUTLINE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)-\s*\[([^\]]+)\]\s*([^,]+?)(?:,\s*(.+))?$")
        .expect("outline line pattern is valid")
});

/// `## logical_id`
static ITEM_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s+(\S+)$").expect("item header pattern is valid"));

/// `### field`
static FIELD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s+(\S+)$").expect("field header pattern is valid"));

/// Columns per indentation level
const INDENT_WIDTH: usize = 4;

/// Free-text fields the content section may fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentField {
    Description,
    Design,
    AcceptanceCriteria,
    Notes,
}

impl ContentField {
    fn from_header(name: &str) -> Option<Self> {
        match name {
            "description" => Some(Self::Description),
            "design" => Some(Self::Design),
            "acceptance_criteria" => Some(Self::AcceptanceCriteria),
            "notes" => Some(Self::Notes),
            _ => None,
        }
    }

    fn slot(self, item: &mut ParsedItem) -> &mut String {
        match self {
            Self::Description => &mut item.description,
            Self::Design => &mut item.design,
            Self::AcceptanceCriteria => &mut item.acceptance_criteria,
            Self::Notes => &mut item.notes,
        }
    }
}

/// Parse and validate a document.
///
/// Line numbers in errors and warnings count from the top of the document,
/// starting at 1.
pub fn parse_document(text: &str) -> ParsedDocument {
    let lines: Vec<&str> = text.lines().collect();
    let mut doc = ParsedDocument::default();

    let Some(structure_start) = find_section(&lines, STRUCTURE_SECTION) else {
        doc.errors.push(ImportError::MissingStructureSection);
        return doc;
    };
    let content_start = find_section(&lines, CONTENT_SECTION);
    let structure_end = content_start
        .filter(|&start| start > structure_start)
        .unwrap_or(lines.len());

    let index = parse_outline(&lines, structure_start, structure_end, &mut doc);
    if let Some(start) = content_start {
        parse_content(&lines, start, &index, &mut doc);
    }

    validate(&mut doc);
    doc
}

/// Index of the line after the first `# <name>` header
fn find_section(lines: &[&str], name: &str) -> Option<usize> {
    lines
        .iter()
        .position(|line| is_section_header(line, name))
        .map(|pos| pos + 1)
}

fn is_section_header(line: &str, name: &str) -> bool {
    let Some(rest) = line.trim().strip_prefix('#') else {
        return false;
    };
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }
    rest.trim_start()
        .get(..name.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(name))
}

/// Width of leading whitespace. A tab counts as one full indent level
/// rather than a single column, so tab-indented outlines nest the same
/// way as space-indented ones.
fn indent_columns(indent: &str) -> usize {
    indent
        .chars()
        .map(|c| if c == '\t' { INDENT_WIDTH } else { 1 })
        .sum()
}

/// Parse outline lines `start..end`, returning logical id -> item index
fn parse_outline(
    lines: &[&str],
    start: usize,
    end: usize,
    doc: &mut ParsedDocument,
) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    // (logical_id, depth) of the lines enclosing the current one
    let mut ancestors: Vec<(String, usize)> = Vec::new();

    for (pos, raw) in lines.iter().enumerate().take(end).skip(start) {
        let line_no = pos + 1;
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(caps) = OUTLINE_LINE.captures(line) else {
            continue;
        };

        let depth = indent_columns(&caps[1]) / INDENT_WIDTH;
        let logical_id = caps[2].trim();
        if logical_id.is_empty() {
            doc.errors.push(ImportError::EmptyLogicalId { line: line_no });
            continue;
        }
        if index.contains_key(logical_id) {
            doc.errors.push(ImportError::DuplicateLogicalId {
                line: line_no,
                logical_id: logical_id.to_string(),
            });
            continue;
        }
        let title = caps[3].trim();
        if title.is_empty() {
            doc.errors.push(ImportError::EmptyTitle {
                line: line_no,
                logical_id: logical_id.to_string(),
            });
            continue;
        }

        let mut item = ParsedItem {
            logical_id: logical_id.to_string(),
            title: title.to_string(),
            issue_type: IssueType::Task,
            priority: DEFAULT_PRIORITY,
            assignee: None,
            estimated_minutes: None,
            dependencies: Vec::new(),
            parent: None,
            depth,
            line: line_no,
            description: String::new(),
            design: String::new(),
            acceptance_criteria: String::new(),
            notes: String::new(),
        };
        if let Some(params) = caps.get(4) {
            apply_parameters(&mut item, params.as_str(), &mut doc.warnings);
        }

        if depth > 0 {
            while ancestors.last().is_some_and(|(_, d)| *d >= depth) {
                ancestors.pop();
            }
            match ancestors.last() {
                Some((parent, _)) => item.parent = Some(parent.clone()),
                None => doc.warnings.push(ImportWarning::OrphanIndent {
                    line: line_no,
                    logical_id: item.logical_id.clone(),
                }),
            }
        }

        ancestors.push((item.logical_id.clone(), depth));
        index.insert(item.logical_id.clone(), doc.items.len());
        doc.items.push(item);
    }

    index
}

fn apply_parameters(item: &mut ParsedItem, params: &str, warnings: &mut Vec<ImportWarning>) {
    let line = item.line;
    for param in split_parameters(params) {
        let Some((key, value)) = param.split_once('=') else {
            warnings.push(ImportWarning::MalformedParameter {
                line,
                logical_id: item.logical_id.clone(),
                parameter: param,
            });
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "t" => {
                item.issue_type = value.parse().unwrap_or_else(|_| {
                    warnings.push(ImportWarning::InvalidType {
                        line,
                        logical_id: item.logical_id.clone(),
                        value: value.to_string(),
                    });
                    IssueType::Task
                });
            }
            "p" => {
                item.priority = match value.parse::<u8>() {
                    Ok(priority) if priority <= MAX_PRIORITY => priority,
                    _ => {
                        warnings.push(ImportWarning::InvalidPriority {
                            line,
                            logical_id: item.logical_id.clone(),
                            value: value.to_string(),
                        });
                        DEFAULT_PRIORITY
                    }
                };
            }
            "assignee" => {
                item.assignee = (!value.is_empty()).then(|| value.to_string());
            }
            "est" => {
                item.estimated_minutes = match value.parse::<u32>() {
                    Ok(minutes) if minutes > 0 => Some(minutes),
                    _ => {
                        warnings.push(ImportWarning::InvalidEstimate {
                            line,
                            logical_id: item.logical_id.clone(),
                            value: value.to_string(),
                        });
                        None
                    }
                };
            }
            "deps" => item.dependencies = parse_dependency_list(value),
            _ => warnings.push(ImportWarning::UnknownParameter {
                line,
                logical_id: item.logical_id.clone(),
                key: key.to_string(),
            }),
        }
    }
}

/// Split on commas outside square brackets
fn split_parameters(params: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0i32;

    for c in params.chars() {
        match c {
            '[' => bracket_depth += 1,
            ']' => bracket_depth -= 1,
            ',' if bracket_depth == 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}

/// `[a, b]` or `a` into its non-empty ids
fn parse_dependency_list(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    inner
        .split(',')
        .map(str::trim)
        .filter(|dep| !dep.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_content(
    lines: &[&str],
    start: usize,
    index: &HashMap<String, usize>,
    doc: &mut ParsedDocument,
) {
    let mut section: Option<usize> = None;
    let mut field: Option<ContentField> = None;
    let mut body: Vec<&str> = Vec::new();

    for raw in lines.iter().skip(start) {
        let line = raw.trim_end();

        if let Some(caps) = ITEM_HEADER.captures(line) {
            store_body(doc, section, field, &mut body);
            field = None;
            section = index.get(&caps[1]).copied();
            if section.is_none() {
                doc.warnings.push(ImportWarning::UnknownContentSection {
                    logical_id: caps[1].to_string(),
                });
            }
            continue;
        }

        if let Some(caps) = FIELD_HEADER.captures(line) {
            store_body(doc, section, field, &mut body);
            field = ContentField::from_header(&caps[1]);
            if field.is_none() {
                doc.warnings.push(ImportWarning::UnknownContentField {
                    logical_id: section.map(|i| doc.items[i].logical_id.clone()),
                    field: caps[1].to_string(),
                });
            }
            continue;
        }

        if section.is_some() && field.is_some() {
            body.push(line);
        }
    }

    store_body(doc, section, field, &mut body);
}

fn store_body(
    doc: &mut ParsedDocument,
    section: Option<usize>,
    field: Option<ContentField>,
    body: &mut Vec<&str>,
) {
    let lines = std::mem::take(body);
    if lines.is_empty() {
        return;
    }
    let (Some(section), Some(field)) = (section, field) else {
        return;
    };
    if let Some(item) = doc.items.get_mut(section) {
        *field.slot(item) = lines.join("\n").trim().to_string();
    }
}
