//! CLI argument structs for all commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::types::{DependencyTypeArg, IssueStatusArg, IssueTypeArg};
use super::validators::{validate_issue_id, validate_prefix, validate_title};
use crate::domain::{MAX_PRIORITY, MIN_PRIORITY};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Issue ID prefix (e.g., "proj" for "proj-a3f8")
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `create` command
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Issue title
    #[arg(value_parser = validate_title)]
    pub title: String,

    /// Detailed description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Priority level (0=critical, 1=high, 2=medium, 3=low, 4=backlog)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)), default_value = "2")]
    pub priority: u8,

    /// Issue type
    #[arg(short = 't', long = "type", value_enum, default_value = "task")]
    pub issue_type: IssueTypeArg,

    /// Assignee
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Estimated effort in minutes
    #[arg(short, long)]
    pub estimate: Option<u32>,

    /// Design notes
    #[arg(long)]
    pub design: Option<String>,

    /// Acceptance criteria
    #[arg(long)]
    pub acceptance: Option<String>,

    /// Parent issue; adds a parent-child edge
    #[arg(long, value_parser = validate_issue_id)]
    pub parent: Option<String>,

    /// Issues that block this one (comma-separated)
    #[arg(long, value_delimiter = ',', value_parser = validate_issue_id)]
    pub blocked_by: Vec<String>,
}

/// Arguments for the `update` command
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Issue ID to update
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,

    /// New title
    #[arg(long, value_parser = validate_title)]
    pub title: Option<String>,

    /// New description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// New priority
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)))]
    pub priority: Option<u8>,

    /// New issue type
    #[arg(short = 't', long = "type", value_enum)]
    pub issue_type: Option<IssueTypeArg>,

    /// New assignee
    #[arg(short, long, conflicts_with = "no_assignee")]
    pub assignee: Option<String>,

    /// Clear the assignee
    #[arg(long)]
    pub no_assignee: bool,

    /// New estimate in minutes
    #[arg(short, long)]
    pub estimate: Option<u32>,

    /// New design notes
    #[arg(long)]
    pub design: Option<String>,

    /// New acceptance criteria
    #[arg(long)]
    pub acceptance: Option<String>,

    /// New notes
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for the `list` command
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<IssueStatusArg>,

    /// Filter by priority
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)))]
    pub priority: Option<u8>,

    /// Filter by issue type
    #[arg(short = 't', long = "type", value_enum)]
    pub issue_type: Option<IssueTypeArg>,

    /// Filter by assignee
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Only issues whose title, description or ID contains this text
    #[arg(long)]
    pub search: Option<String>,

    /// Number of matching issues to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Maximum number of issues to display
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

/// Arguments for commands that take a single issue
#[derive(Parser, Debug, Clone)]
pub struct IssueArgs {
    /// Issue ID
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,
}

/// Arguments for `start`, `block`, `unblock`, `close` and `reopen`
#[derive(Parser, Debug, Clone)]
pub struct TransitionArgs {
    /// Issue ID
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,

    /// Comment stored with the status change
    #[arg(short, long)]
    pub comment: Option<String>,
}

/// Arguments for the `comment` command
#[derive(Parser, Debug, Clone)]
pub struct CommentArgs {
    /// Issue ID
    #[arg(value_parser = validate_issue_id)]
    pub issue_id: String,

    /// Comment text
    pub text: String,
}

/// Arguments for the `ready` command
#[derive(Parser, Debug, Clone)]
pub struct ReadyArgs {
    /// Filter by assignee
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Filter by priority
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_PRIORITY)..=i64::from(MAX_PRIORITY)))]
    pub priority: Option<u8>,

    /// Filter by issue type
    #[arg(short = 't', long = "type", value_enum)]
    pub issue_type: Option<IssueTypeArg>,

    /// Maximum number of issues to display (default from config)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

/// Arguments for the `dep` command
#[derive(Parser, Debug, Clone)]
pub struct DepArgs {
    /// Dependency subcommand
    #[command(subcommand)]
    pub action: DepAction,
}

/// Dependency management actions
#[derive(Subcommand, Debug, Clone)]
pub enum DepAction {
    /// Add an edge: FROM depends on (or is a child of) TO
    Add {
        /// Dependent issue
        #[arg(value_parser = validate_issue_id)]
        from: String,

        /// Issue being depended on
        #[arg(value_parser = validate_issue_id)]
        to: String,

        /// Dependency type
        #[arg(short = 't', long = "type", value_enum, default_value = "blocks")]
        dep_type: DependencyTypeArg,
    },

    /// Remove edges between two issues
    #[command(alias = "remove")]
    Rm {
        /// Dependent issue
        #[arg(value_parser = validate_issue_id)]
        from: String,

        /// Issue being depended on
        #[arg(value_parser = validate_issue_id)]
        to: String,

        /// Only remove this type (default: every type)
        #[arg(short = 't', long = "type", value_enum)]
        dep_type: Option<DependencyTypeArg>,
    },

    /// List edges of an issue
    List {
        /// Issue ID
        #[arg(value_parser = validate_issue_id)]
        issue_id: String,

        /// Show reverse dependencies (issues that depend on this one)
        #[arg(short, long)]
        reverse: bool,
    },

    /// Show the transitive dependency tree
    Tree {
        /// Root issue
        #[arg(value_parser = validate_issue_id)]
        issue_id: String,

        /// Maximum depth (default from config)
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

/// Arguments for the `reorder` command
#[derive(Parser, Debug, Clone)]
pub struct ReorderArgs {
    /// Parent issue
    #[arg(value_parser = validate_issue_id)]
    pub parent: String,

    /// Children in their new order
    #[arg(required = true, value_parser = validate_issue_id)]
    pub children: Vec<String>,
}

/// Arguments for the `eligible` command
#[derive(Parser, Debug, Clone)]
pub struct EligibleArgs {
    /// Which side of the relationship to enumerate
    #[command(subcommand)]
    pub action: EligibleAction,
}

/// Candidate enumeration actions
#[derive(Subcommand, Debug, Clone)]
pub enum EligibleAction {
    /// Issues that could become this issue's parent
    Parents {
        /// Issue ID
        #[arg(value_parser = validate_issue_id)]
        issue_id: String,
    },

    /// Issues that could become this issue's children
    Children {
        /// Issue ID
        #[arg(value_parser = validate_issue_id)]
        issue_id: String,
    },
}

/// Arguments for the `import` command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Outline document to import
    pub file: PathBuf,

    /// Parse and validate without writing anything
    #[arg(long)]
    pub validate_only: bool,
}
