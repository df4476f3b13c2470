//! CLI argument parsing and command dispatch.
//!
//! Commands are defined with clap's derive API; each has its own argument
//! struct with validation applied at parse time.
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! trellis create "Design schema" -p 1 -t task --parent proj-a3f8
//! trellis dep add proj-b2c1 proj-a3f8
//! trellis ready -n 5
//! trellis import plan.md --validate-only
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    CommentArgs, CreateArgs, DepAction, DepArgs, EligibleAction, EligibleArgs, ImportArgs,
    InitArgs, IssueArgs, ListArgs, ReadyArgs, ReorderArgs, TransitionArgs, UpdateArgs,
};
pub use types::{DependencyTypeArg, IssueStatusArg, IssueTypeArg};
pub use validators::{validate_issue_id, validate_prefix, validate_title};

use crate::error::ErrorKind;

/// Trellis - dependency-aware work item tracking
///
/// Tracks work items, the edges between them and the parent/child hierarchy,
/// and answers which items are ready to start.
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new trellis workspace
    ///
    /// Creates `.trellis/` with a configuration file and an empty data file.
    Init(InitArgs),

    /// Create a new issue
    Create(CreateArgs),

    /// Update fields of an existing issue
    ///
    /// Only provided fields change. Status changes through `start`, `block`,
    /// `unblock`, `close` and `reopen`.
    Update(UpdateArgs),

    /// Show an issue with its edges and history
    Show(IssueArgs),

    /// List issues with optional filters
    List(ListArgs),

    /// Start work on an issue
    Start(TransitionArgs),

    /// Mark an issue as blocked
    Block(TransitionArgs),

    /// Clear the blocked mark
    Unblock(TransitionArgs),

    /// Close an issue
    Close(TransitionArgs),

    /// Reopen a closed issue
    Reopen(TransitionArgs),

    /// Add a comment to an issue
    Comment(CommentArgs),

    /// Delete an issue that has no children or dependents
    Delete(IssueArgs),

    /// Show issues ready to work on
    ///
    /// An issue is ready when it is open or in progress, no open issue blocks
    /// it, and it has no open children.
    Ready(ReadyArgs),

    /// Show issues that are not ready, with what holds them back
    Blocked,

    /// Explain why an issue is not ready
    Why(IssueArgs),

    /// Manage dependency edges
    Dep(DepArgs),

    /// List the children of an issue in order
    Children(IssueArgs),

    /// Reorder the children of an issue
    Reorder(ReorderArgs),

    /// List candidate parents or children for an issue
    Eligible(EligibleArgs),

    /// Import issues from an outline document
    Import(ImportArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::domain::Transition;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Trellis work item tracker");
            println!("Use --help for more information");
            return Ok(());
        };

        match command {
            Commands::Init(args) => execute::execute_init(args, output_mode).await,
            Commands::Create(args) => {
                execute::execute_create(&open_app().await?, args, output_mode).await
            }
            Commands::Update(args) => {
                execute::execute_update(&open_app().await?, args, output_mode).await
            }
            Commands::Show(args) => execute::execute_show(&open_app().await?, args, output_mode).await,
            Commands::List(args) => execute::execute_list(&open_app().await?, args, output_mode).await,
            Commands::Start(args) => {
                execute::execute_transition(&open_app().await?, args, Transition::Start, output_mode)
                    .await
            }
            Commands::Block(args) => {
                execute::execute_transition(&open_app().await?, args, Transition::Block, output_mode)
                    .await
            }
            Commands::Unblock(args) => {
                execute::execute_transition(&open_app().await?, args, Transition::Unblock, output_mode)
                    .await
            }
            Commands::Close(args) => {
                execute::execute_transition(&open_app().await?, args, Transition::Close, output_mode)
                    .await
            }
            Commands::Reopen(args) => {
                execute::execute_transition(&open_app().await?, args, Transition::Reopen, output_mode)
                    .await
            }
            Commands::Comment(args) => {
                execute::execute_comment(&open_app().await?, args, output_mode).await
            }
            Commands::Delete(args) => {
                execute::execute_delete(&open_app().await?, args, output_mode).await
            }
            Commands::Ready(args) => execute::execute_ready(&open_app().await?, args, output_mode).await,
            Commands::Blocked => execute::execute_blocked(&open_app().await?, output_mode).await,
            Commands::Why(args) => execute::execute_why(&open_app().await?, args, output_mode).await,
            Commands::Dep(args) => execute::execute_dep(&open_app().await?, args, output_mode).await,
            Commands::Children(args) => {
                execute::execute_children(&open_app().await?, args, output_mode).await
            }
            Commands::Reorder(args) => {
                execute::execute_reorder(&open_app().await?, args, output_mode).await
            }
            Commands::Eligible(args) => {
                execute::execute_eligible(&open_app().await?, args, output_mode).await
            }
            Commands::Import(args) => {
                execute::execute_import(&open_app().await?, args, output_mode).await
            }
        }
    }
}

async fn open_app() -> Result<crate::app::App> {
    Ok(crate::app::App::from_directory(&std::env::current_dir()?).await?)
}

/// Process exit code for a failed command.
///
/// | code | meaning                                   |
/// |------|-------------------------------------------|
/// | 1    | unexpected failure                        |
/// | 2    | invalid input or failed validation        |
/// | 3    | issue or edge not found                   |
/// | 4    | refused: cycle, hierarchy, status, exists |
/// | 5    | storage failure                           |
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let Some(err) = err.downcast_ref::<crate::Error>() else {
        return 1;
    };
    match err.kind() {
        ErrorKind::Invalid | ErrorKind::ValidationFailed => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::CycleRejected
        | ErrorKind::HierarchyViolation
        | ErrorKind::PreconditionFailed
        | ErrorKind::Conflict => 4,
        ErrorKind::Storage => 5,
    }
}
