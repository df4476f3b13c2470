//! Immutable audit events.

use super::IssueId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of audited change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Issue was created
    Created,
    /// Content fields changed
    Updated,
    /// Status changed (start, block, unblock)
    StatusChanged,
    /// Free-form comment
    Commented,
    /// Issue was closed
    Closed,
    /// Issue was reopened
    Reopened,
    /// Edge added with this issue as its source
    DependencyAdded,
    /// Edge removed with this issue as its source
    DependencyRemoved,
}

impl EventKind {
    /// Snake-case name used in JSON and text output
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::StatusChanged => "status_changed",
            EventKind::Commented => "commented",
            EventKind::Closed => "closed",
            EventKind::Reopened => "reopened",
            EventKind::DependencyAdded => "dependency_added",
            EventKind::DependencyRemoved => "dependency_removed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit record, written in the same session as the change it describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned, monotonically increasing id
    pub id: u64,
    /// The issue the event belongs to
    pub issue_id: IssueId,
    /// What happened
    pub kind: EventKind,
    /// Who did it
    pub actor: String,
    /// Previous value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    /// New value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    /// Optional comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When it happened
    pub created_at: DateTime<Utc>,
}

/// Event data before the store assigns an id and timestamp
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// The issue the event belongs to
    pub issue_id: IssueId,
    /// What happened
    pub kind: EventKind,
    /// Who did it
    pub actor: String,
    /// Previous value, if any
    pub old_value: Option<String>,
    /// New value, if any
    pub new_value: Option<String>,
    /// Optional comment
    pub comment: Option<String>,
}

impl NewEvent {
    /// Event with no values attached
    pub fn new(issue_id: IssueId, kind: EventKind, actor: impl Into<String>) -> Self {
        Self {
            issue_id,
            kind,
            actor: actor.into(),
            old_value: None,
            new_value: None,
            comment: None,
        }
    }

    /// Attach old/new values
    #[must_use]
    pub fn values(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_value = old;
        self.new_value = new;
        self
    }

    /// Attach a comment
    #[must_use]
    pub fn comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}
