//! Recursive and aggregate read models returned by graph queries.

use super::{DependencyType, Issue, IssueId, IssueStatus};
use serde::Serialize;

/// One node of a dependency tree.
///
/// The root has no `dep_type`; every other node carries the type of the edge
/// that led to it. A node reached again on its own branch is reported with
/// `circular: true` and no children instead of being expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyTree {
    /// Issue at this node
    pub issue_id: IssueId,
    /// Edge type from the parent node (None for the root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dep_type: Option<DependencyType>,
    /// Issue title, if the issue still exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Issue status, if the issue still exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    /// This node was already on the path from the root
    pub circular: bool,
    /// Expansion stopped here because the depth limit was reached
    pub truncated: bool,
    /// Dependencies of this node
    pub dependencies: Vec<DependencyTree>,
}

impl DependencyTree {
    /// Number of nodes in the tree, root included
    pub fn len(&self) -> usize {
        1 + self.dependencies.iter().map(DependencyTree::len).sum::<usize>()
    }

    /// A tree always has its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Maximum depth below the root (0 for a lone root)
    pub fn depth(&self) -> usize {
        self.dependencies
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// A non-closed issue together with what keeps it out of the ready set
#[derive(Debug, Clone, Serialize)]
pub struct BlockedIssue {
    /// The issue that is not ready
    pub issue: Issue,
    /// Open targets of its `blocks` edges
    pub blockers: Vec<Issue>,
    /// Its children that are not closed yet
    pub open_children: Vec<Issue>,
}
