//! Building and merging the graph from an outline document.
//!
//! A document has an outline section and an optional content section:
//!
//! ```text
//! # Issues Structure
//! - [epic1] Payments overhaul, t=Epic, p=0
//!     - [feat1] Card vault, t=Feature, assignee=ana, est=240
//!         - [task1] Schema, deps=[task2]
//!         - [task2] Migration
//! # Detailed Content
//! ## task1
//! ### description
//! Tables for tokenised cards.
//! ```
//!
//! Indentation (four columns per level, a tab counts as four) nests items
//! under the nearest shallower line. [`parse_document`] turns the text into a
//! [`ParsedDocument`] carrying every error and warning it found;
//! [`Engine::import_document`](crate::engine::Engine::import_document) then
//! applies a valid document to the store in one session.
//!
//! ```
//! use trellis::import::parse_document;
//!
//! let doc = parse_document("# Issues Structure\n- [a] First\n- [b] Second, deps=[a]\n");
//! assert!(doc.is_valid());
//! assert_eq!(doc.items[1].dependencies, vec!["a".to_string()]);
//! ```

mod parser;
mod reconcile;
mod validate;

pub use parser::parse_document;
pub use reconcile::IMPORT_ACTOR;

use crate::domain::{DependencyType, IssueType};
use serde::Serialize;
use thiserror::Error;

/// Header of the required outline section
pub const STRUCTURE_SECTION: &str = "Issues Structure";

/// Header of the optional content section
pub const CONTENT_SECTION: &str = "Detailed Content";

/// One outline line after parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedItem {
    /// Identifier inside the document
    pub logical_id: String,

    /// Item title
    pub title: String,

    /// Item type (`t=`)
    pub issue_type: IssueType,

    /// Priority (`p=`)
    pub priority: u8,

    /// Assignee (`assignee=`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Estimate in minutes (`est=`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,

    /// Logical ids this item is blocked by (`deps=[..]`)
    pub dependencies: Vec<String>,

    /// Logical id of the enclosing item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Indentation level
    pub depth: usize,

    /// 1-based line number in the document
    pub line: usize,

    /// `### description` body
    pub description: String,

    /// `### design` body
    pub design: String,

    /// `### acceptance_criteria` body
    pub acceptance_criteria: String,

    /// `### notes` body
    pub notes: String,
}

/// Result of parsing a document.
///
/// Items are in document order. A document with any error is refused by the
/// importer as a whole.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedDocument {
    /// Parsed items, in document order
    pub items: Vec<ParsedItem>,

    /// Problems that block the import
    pub errors: Vec<ImportError>,

    /// Problems that were worked around
    pub warnings: Vec<ImportWarning>,
}

impl ParsedDocument {
    /// Whether the document can be imported
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Look up an item by logical id
    pub fn get(&self, logical_id: &str) -> Option<&ParsedItem> {
        self.items.iter().find(|item| item.logical_id == logical_id)
    }
}

/// Structural problem that makes a document unimportable
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportError {
    /// No `# Issues Structure` header
    #[error("Missing '# Issues Structure' section")]
    MissingStructureSection,

    /// `[ ]` with nothing inside
    #[error("Line {line}: Empty logical ID")]
    EmptyLogicalId {
        /// Line number
        line: usize,
    },

    /// Logical id already declared earlier in the document
    #[error("Line {line}: Duplicate logical ID '{logical_id}'")]
    DuplicateLogicalId {
        /// Line number
        line: usize,
        /// The repeated id
        logical_id: String,
    },

    /// Blank title
    #[error("Line {line}: Empty title for issue '{logical_id}'")]
    EmptyTitle {
        /// Line number
        line: usize,
        /// Item with the blank title
        logical_id: String,
    },

    /// `deps=` names an id the document doesn't declare
    #[error("Issue '{logical_id}' depends on unknown issue '{dependency}'")]
    UnknownDependency {
        /// Dependent item
        logical_id: String,
        /// Undeclared id
        dependency: String,
    },

    /// The `deps=` graph has a cycle
    #[error("Circular dependency detected involving issue '{logical_id}'")]
    DependencyCycle {
        /// An item on the cycle
        logical_id: String,
    },

    /// Nesting pairs types the hierarchy table forbids
    #[error(
        "Invalid type hierarchy: {parent_type} '{parent}' cannot have {child_type} '{child}' as child"
    )]
    HierarchyViolation {
        /// Enclosing item
        parent: String,
        /// Its type
        parent_type: IssueType,
        /// Nested item
        child: String,
        /// Its type
        child_type: IssueType,
    },
}

/// Problem that was worked around
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportWarning {
    /// Parameter key other than `t`, `p`, `assignee`, `est`, `deps`
    #[error("Line {line}: Unknown parameter '{key}' for issue '{logical_id}'")]
    UnknownParameter {
        /// Line number
        line: usize,
        /// Item
        logical_id: String,
        /// The key
        key: String,
    },

    /// Parameter without `=`
    #[error("Line {line}: Invalid parameter format '{parameter}' for issue '{logical_id}'")]
    MalformedParameter {
        /// Line number
        line: usize,
        /// Item
        logical_id: String,
        /// The raw parameter
        parameter: String,
    },

    /// Unknown `t=` value; the item becomes a task
    #[error("Line {line}: Invalid issue type '{value}' for issue '{logical_id}', using 'task'")]
    InvalidType {
        /// Line number
        line: usize,
        /// Item
        logical_id: String,
        /// The raw value
        value: String,
    },

    /// Unparseable or out-of-range `p=`; the default priority is used
    #[error("Line {line}: Invalid priority '{value}' for issue '{logical_id}', using 2")]
    InvalidPriority {
        /// Line number
        line: usize,
        /// Item
        logical_id: String,
        /// The raw value
        value: String,
    },

    /// Non-positive or unparseable `est=`; the estimate is dropped
    #[error("Line {line}: Invalid estimate '{value}' for issue '{logical_id}', ignoring")]
    InvalidEstimate {
        /// Line number
        line: usize,
        /// Item
        logical_id: String,
        /// The raw value
        value: String,
    },

    /// Indented line with no shallower line above it
    #[error("Line {line}: Issue '{logical_id}' is indented but has no parent")]
    OrphanIndent {
        /// Line number
        line: usize,
        /// Item
        logical_id: String,
    },

    /// `## id` for an id the outline doesn't declare
    #[error("Detailed content section for unknown issue '{logical_id}'")]
    UnknownContentSection {
        /// The undeclared id
        logical_id: String,
    },

    /// `### field` other than the four content fields
    #[error("Unknown content field '{field}' for issue '{}'", .logical_id.as_deref().unwrap_or("-"))]
    UnknownContentField {
        /// Enclosing section, if it was a known item
        logical_id: Option<String>,
        /// The field name
        field: String,
    },

    /// Dependency on the item's own parent, already implied by nesting
    #[error("Skipped dependency '{logical_id}' -> '{dependency}': already its parent")]
    RedundantParentDependency {
        /// Child item
        logical_id: String,
        /// Its parent
        dependency: String,
    },

    /// Edge the store refused while importing
    #[error("Skipped {dep_type} edge '{from}' -> '{to}': {reason}")]
    SkippedEdge {
        /// Source logical id
        from: String,
        /// Target logical id
        to: String,
        /// Edge type
        dep_type: DependencyType,
        /// Why the store refused it
        reason: String,
    },
}

/// Outcome of [`Engine::import_document`](crate::engine::Engine::import_document)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Items created
    pub created: usize,

    /// Existing items overwritten in place
    pub updated: usize,

    /// New edges (edges already present are not counted)
    pub edges_created: usize,

    /// Items in the document
    pub logical_ids_processed: usize,

    /// Parse warnings followed by skipped edges
    pub warnings: Vec<ImportWarning>,
}
