//! Domain types for the work-item graph.
//!
//! This module contains the core domain types: work items ([`Issue`]), the
//! typed edges between them ([`DependencyEdge`]), audit events, and the
//! request/response shapes used by the engine.

mod event;
mod status;
mod tree;

pub use event::{Event, EventKind, NewEvent};
pub use status::{IssueStatus, Transition};
pub use tree::{BlockedIssue, DependencyTree};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest priority value (most urgent)
pub const MIN_PRIORITY: u8 = 0;

/// Lowest priority value (backlog)
pub const MAX_PRIORITY: u8 = 4;

/// Priority used when none is given
pub const DEFAULT_PRIORITY: u8 = 2;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 500;

/// Unique identifier for an issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A trackable unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier for the issue
    pub id: IssueId,

    /// Issue title
    pub title: String,

    /// Issue description
    #[serde(default)]
    pub description: String,

    /// Design notes
    #[serde(default)]
    pub design: String,

    /// Acceptance criteria
    #[serde(default)]
    pub acceptance_criteria: String,

    /// Additional notes
    #[serde(default)]
    pub notes: String,

    /// Current status
    pub status: IssueStatus,

    /// Priority level (0 = highest, 4 = lowest)
    pub priority: u8,

    /// Issue type
    pub issue_type: IssueType,

    /// Assignee (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Estimated effort in minutes (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,

    /// Identifier of this item inside an imported document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_id: Option<String>,

    /// Monotonic creation sequence, used as the stable tie-breaker
    pub sequence: u64,

    /// Actor that created the issue
    pub created_by: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Closed timestamp (set by `Close`, cleared by `Reopen`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Check the field-level constraints shared by every storage backend.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message describing the first violated rule.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_priority(self.priority)
    }
}

/// Validate an issue title (non-blank, bounded length).
///
/// # Errors
///
/// Returns a message when the title is blank or too long.
pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Validate a priority value.
///
/// # Errors
///
/// Returns a message when the priority is outside `0..=4`.
pub fn validate_priority(priority: u8) -> Result<(), String> {
    if priority > MAX_PRIORITY {
        return Err(format!(
            "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
        ));
    }
    Ok(())
}

/// Type of work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Large body of work containing features and tasks
    Epic,

    /// New feature
    Feature,

    /// General task
    #[default]
    Task,

    /// Bug fix
    Bug,

    /// Maintenance/chore
    Chore,
}

impl IssueType {
    /// Every issue type, in hierarchy order
    pub const ALL: [IssueType; 5] = [
        IssueType::Epic,
        IssueType::Feature,
        IssueType::Task,
        IssueType::Bug,
        IssueType::Chore,
    ];

    /// Lowercase name used in documents, JSON and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Epic => "epic",
            IssueType::Feature => "feature",
            IssueType::Task => "task",
            IssueType::Bug => "bug",
            IssueType::Chore => "chore",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = String;

    /// Case-insensitive parse (`"Epic"`, `"epic"` and `"EPIC"` are equivalent)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        IssueType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown issue type '{s}'"))
    }
}

/// Type of dependency relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    /// Hard blocker - `from` is not ready until `to` is closed
    Blocks,

    /// Soft link - informational only
    Related,

    /// Containment - `from` is a child of `to`
    ParentChild,
}

impl DependencyType {
    /// Every dependency type
    pub const ALL: [DependencyType; 3] = [
        DependencyType::Blocks,
        DependencyType::Related,
        DependencyType::ParentChild,
    ];

    /// Kebab-case name used in JSON and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Blocks => "blocks",
            DependencyType::Related => "related",
            DependencyType::ParentChild => "parent-child",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DependencyType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("Invalid dependency type '{s}'. Valid types: blocks, related, parent-child")
            })
    }
}

/// Typed directed edge between two issues.
///
/// `issue_id` depends on (or, for [`DependencyType::ParentChild`], is a
/// child of) `depends_on_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The dependent issue (edge source)
    pub issue_id: IssueId,

    /// The issue depended upon (edge target)
    pub depends_on_id: IssueId,

    /// Type of relationship
    pub dep_type: DependencyType,

    /// Position among siblings; only meaningful for parent-child edges
    #[serde(default)]
    pub child_order: u32,

    /// Actor that created the edge
    pub created_by: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new issue
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    /// Issue title
    pub title: String,

    /// Issue description
    pub description: String,

    /// Design notes
    pub design: String,

    /// Acceptance criteria
    pub acceptance_criteria: String,

    /// Additional notes
    pub notes: String,

    /// Priority level (0-4)
    pub priority: u8,

    /// Issue type
    pub issue_type: IssueType,

    /// Assignee (optional)
    pub assignee: Option<String>,

    /// Estimated effort in minutes (optional)
    pub estimated_minutes: Option<u32>,

    /// Logical id when created by the importer
    pub logical_id: Option<String>,
}

impl NewIssue {
    /// A task with the given title and the default priority
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: DEFAULT_PRIORITY,
            ..Self::default()
        }
    }

    /// Set the issue type
    #[must_use]
    pub fn with_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = issue_type;
        self
    }

    /// Set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Validate the new issue data.
    ///
    /// # Errors
    ///
    /// Returns a message when the title or priority is invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_priority(self.priority)
    }
}

/// Data for updating an existing issue.
///
/// Status is deliberately absent: status only changes through
/// [`Transition`]s.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    /// New title (if updating)
    pub title: Option<String>,

    /// New description (if updating)
    pub description: Option<String>,

    /// New design notes (if updating)
    pub design: Option<String>,

    /// New acceptance criteria (if updating)
    pub acceptance_criteria: Option<String>,

    /// New notes (if updating)
    pub notes: Option<String>,

    /// New priority (if updating)
    pub priority: Option<u8>,

    /// New issue type (if updating)
    pub issue_type: Option<IssueType>,

    /// New assignee (if updating, `Some(None)` to clear)
    pub assignee: Option<Option<String>>,

    /// New estimate (if updating, `Some(None)` to clear)
    pub estimated_minutes: Option<Option<u32>>,

    /// New logical id (if updating)
    pub logical_id: Option<String>,
}

impl IssueUpdate {
    /// Apply the present fields to `issue`. Returns `true` if anything changed.
    pub(crate) fn apply_to(self, issue: &mut Issue) -> bool {
        let before = issue.clone();

        if let Some(title) = self.title {
            issue.title = title;
        }
        if let Some(description) = self.description {
            issue.description = description;
        }
        if let Some(design) = self.design {
            issue.design = design;
        }
        if let Some(acceptance_criteria) = self.acceptance_criteria {
            issue.acceptance_criteria = acceptance_criteria;
        }
        if let Some(notes) = self.notes {
            issue.notes = notes;
        }
        if let Some(priority) = self.priority {
            issue.priority = priority;
        }
        if let Some(issue_type) = self.issue_type {
            issue.issue_type = issue_type;
        }
        if let Some(assignee) = self.assignee {
            issue.assignee = assignee;
        }
        if let Some(estimate) = self.estimated_minutes {
            issue.estimated_minutes = estimate;
        }
        if let Some(logical_id) = self.logical_id {
            issue.logical_id = Some(logical_id);
        }

        *issue != before
    }
}

/// Filter for querying issues
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    /// Filter by status
    pub status: Option<IssueStatus>,

    /// Filter by priority
    pub priority: Option<u8>,

    /// Filter by issue type
    pub issue_type: Option<IssueType>,

    /// Filter by assignee
    pub assignee: Option<String>,

    /// Case-insensitive substring of the title, description or id
    pub search: Option<String>,

    /// Number of matching issues to skip
    pub offset: usize,

    /// Limit number of results
    pub limit: Option<usize>,
}

impl IssueFilter {
    /// Whether `issue` passes every present criterion (paging is ignored)
    pub fn matches(&self, issue: &Issue) -> bool {
        if self.status.is_some_and(|s| s != issue.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != issue.priority) {
            return false;
        }
        if self.issue_type.is_some_and(|t| t != issue.issue_type) {
            return false;
        }
        if let Some(assignee) = &self.assignee {
            if issue.assignee.as_ref() != Some(assignee) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let found = [issue.title.as_str(), issue.description.as_str(), issue.id.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }
        true
    }
}
