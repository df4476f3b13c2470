//! Command execution logic.
//!
//! Each mutating command saves the store once at the end, so a command that
//! fails part-way leaves the data file untouched.

use anyhow::{Context, Result};
use serde::Serialize;

use super::args::{
    CommentArgs, CreateArgs, DepAction, DepArgs, EligibleAction, EligibleArgs, ImportArgs,
    InitArgs, IssueArgs, ListArgs, ReadyArgs, ReorderArgs, TransitionArgs, UpdateArgs,
};
use crate::app::App;
use crate::domain::{
    DependencyType, IssueFilter, IssueId, IssueUpdate, NewIssue, Transition,
};
use crate::error::Error;
use crate::import::parse_document;
use crate::output::{self, OutputMode};

/// Print `value` as JSON, or run the text writer
fn emit<T, F>(output_mode: OutputMode, value: &T, text: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut std::io::StdoutLock<'static>, &output::OutputConfig) -> std::io::Result<()>,
{
    match output_mode {
        OutputMode::Json => output::print_json(value)?,
        OutputMode::Text => output::print_text(text)?,
    }
    Ok(())
}

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&result)?,
        OutputMode::Text if args.quiet => {}
        OutputMode::Text => {
            println!("Initialized trellis in {}", result.trellis_dir.display());
            println!("  Config: {}", result.config_file.display());
            println!("  Issues: {}", result.issues_file.display());
            println!("  Issue prefix: {}", result.prefix);
        }
    }
    Ok(())
}

/// Execute the create command
///
/// `--parent` and `--blocked-by` edges are added after the issue exists;
/// if any edge is refused nothing is saved.
pub async fn execute_create(app: &App, args: &CreateArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();

    let new_issue = NewIssue {
        title: args.title.clone(),
        description: args.description.clone().unwrap_or_default(),
        design: args.design.clone().unwrap_or_default(),
        acceptance_criteria: args.acceptance.clone().unwrap_or_default(),
        priority: args.priority,
        issue_type: args.issue_type.into(),
        assignee: args.assignee.clone(),
        estimated_minutes: args.estimate,
        ..NewIssue::default()
    };
    let issue = engine.create_issue(new_issue).await?;

    if let Some(parent) = &args.parent {
        engine
            .add_dependency(&issue.id, &IssueId::new(parent), DependencyType::ParentChild)
            .await?;
    }
    for blocker in &args.blocked_by {
        engine
            .add_dependency(&issue.id, &IssueId::new(blocker), DependencyType::Blocks)
            .await?;
    }
    app.save().await?;

    emit(output_mode, &issue, |w, config| {
        use std::io::Write;
        write!(w, "{} ", output::success("Created", config))?;
        output::write_issue_line(w, &issue, config)
    })
}

/// Execute the update command
pub async fn execute_update(app: &App, args: &UpdateArgs, output_mode: OutputMode) -> Result<()> {
    let assignee = if args.no_assignee {
        Some(None)
    } else {
        args.assignee.clone().map(Some)
    };
    let update = IssueUpdate {
        title: args.title.clone(),
        description: args.description.clone(),
        design: args.design.clone(),
        acceptance_criteria: args.acceptance.clone(),
        notes: args.notes.clone(),
        priority: args.priority,
        issue_type: args.issue_type.map(Into::into),
        assignee,
        estimated_minutes: args.estimate.map(Some),
        logical_id: None,
    };

    let issue = app
        .engine()
        .update_issue(&IssueId::new(&args.issue_id), update)
        .await?;
    app.save().await?;

    emit(output_mode, &issue, |w, config| {
        use std::io::Write;
        write!(w, "{} ", output::success("Updated", config))?;
        output::write_issue_line(w, &issue, config)
    })
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &IssueArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let id = IssueId::new(&args.issue_id);

    let issue = engine.get_issue(&id).await?;
    let dependencies = engine.get_dependencies(&id).await?;
    let dependents = engine.get_dependents(&id).await?;
    let events = engine.events(&id).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "issue": issue,
            "dependencies": dependencies,
            "dependents": dependents,
            "events": events,
        }))?,
        OutputMode::Text => output::print_text(|w, config| {
            output::write_issue_details(w, &issue, &dependencies, &dependents, &events, config)
        })?,
    }
    Ok(())
}

/// Execute the list command
pub async fn execute_list(app: &App, args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let filter = IssueFilter {
        status: args.status.map(Into::into),
        priority: args.priority,
        issue_type: args.issue_type.map(Into::into),
        assignee: args.assignee.clone(),
        search: args.search.clone(),
        offset: args.offset,
        limit: Some(args.limit),
    };
    let issues = app.engine().list_issues(&filter).await?;

    emit(output_mode, &issues, |w, config| {
        output::write_issue_list(w, &issues, "No issues found", config)
    })
}

/// Execute `start`, `block`, `unblock`, `close` or `reopen`
pub async fn execute_transition(
    app: &App,
    args: &TransitionArgs,
    transition: Transition,
    output_mode: OutputMode,
) -> Result<()> {
    let issue = app
        .engine()
        .transition(&IssueId::new(&args.issue_id), transition, args.comment.clone())
        .await?;
    app.save().await?;

    emit(output_mode, &issue, |w, config| {
        use std::io::Write;
        write!(w, "{} ", output::success(&format!("{transition}:"), config))?;
        output::write_issue_line(w, &issue, config)
    })
}

/// Execute the comment command
pub async fn execute_comment(app: &App, args: &CommentArgs, output_mode: OutputMode) -> Result<()> {
    let event = app
        .engine()
        .add_comment(&IssueId::new(&args.issue_id), &args.text)
        .await?;
    app.save().await?;

    emit(output_mode, &event, |w, config| {
        use std::io::Write;
        writeln!(w, "{} {}", output::success("Commented on", config), event.issue_id)
    })
}

/// Execute the delete command
pub async fn execute_delete(app: &App, args: &IssueArgs, output_mode: OutputMode) -> Result<()> {
    let issue = app.engine().delete_issue(&IssueId::new(&args.issue_id)).await?;
    app.save().await?;

    emit(output_mode, &issue, |w, config| {
        use std::io::Write;
        write!(w, "{} ", output::success("Deleted", config))?;
        output::write_issue_line(w, &issue, config)
    })
}

/// Execute the ready command
pub async fn execute_ready(app: &App, args: &ReadyArgs, output_mode: OutputMode) -> Result<()> {
    let filter = IssueFilter {
        priority: args.priority,
        issue_type: args.issue_type.map(Into::into),
        assignee: args.assignee.clone(),
        limit: Some(args.limit.unwrap_or(app.config().ready.default_limit)),
        ..IssueFilter::default()
    };
    let issues = app.engine().ready_matching(&filter).await?;

    emit(output_mode, &issues, |w, config| {
        output::write_issue_list(w, &issues, "No ready issues", config)
    })
}

/// Execute the blocked command
pub async fn execute_blocked(app: &App, output_mode: OutputMode) -> Result<()> {
    let blocked = app.engine().blocked().await?;
    emit(output_mode, &blocked, |w, config| {
        output::write_blocked(w, &blocked, config)
    })
}

/// Execute the why command
pub async fn execute_why(app: &App, args: &IssueArgs, output_mode: OutputMode) -> Result<()> {
    let path = app
        .engine()
        .find_blocking_path(&IssueId::new(&args.issue_id))
        .await?;
    emit(output_mode, &path, |w, config| {
        output::write_blocking_path(w, &path, config)
    })
}

/// Execute the dep command
pub async fn execute_dep(app: &App, args: &DepArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();

    match &args.action {
        DepAction::Add { from, to, dep_type } => {
            let edge = engine
                .add_dependency(&IssueId::new(from), &IssueId::new(to), (*dep_type).into())
                .await?;
            app.save().await?;
            emit(output_mode, &edge, |w, config| {
                use std::io::Write;
                writeln!(
                    w,
                    "{} {} -> {} ({})",
                    output::success("Added", config),
                    edge.issue_id,
                    edge.depends_on_id,
                    edge.dep_type
                )
            })
        }
        DepAction::Rm { from, to, dep_type } => {
            let removed = engine
                .remove_dependency(
                    &IssueId::new(from),
                    &IssueId::new(to),
                    dep_type.map(Into::into),
                )
                .await?;
            app.save().await?;
            emit(output_mode, &removed, |w, config| {
                use std::io::Write;
                for edge in &removed {
                    writeln!(
                        w,
                        "{} {} -> {} ({})",
                        output::success("Removed", config),
                        edge.issue_id,
                        edge.depends_on_id,
                        edge.dep_type
                    )?;
                }
                Ok(())
            })
        }
        DepAction::List { issue_id, reverse } => {
            let id = IssueId::new(issue_id);
            let edges = if *reverse {
                engine.get_dependents(&id).await?
            } else {
                engine.get_dependencies(&id).await?
            };
            emit(output_mode, &edges, |w, config| {
                output::write_edges(w, &edges, *reverse, config)
            })
        }
        DepAction::Tree { issue_id, depth } => {
            let max_depth = depth.unwrap_or(app.config().tree.max_depth);
            let tree = engine
                .get_dependency_tree(&IssueId::new(issue_id), max_depth)
                .await?;
            emit(output_mode, &tree, |w, config| {
                output::write_dependency_tree(w, &tree, config)
            })
        }
    }
}

/// Execute the children command
pub async fn execute_children(app: &App, args: &IssueArgs, output_mode: OutputMode) -> Result<()> {
    let children = app
        .engine()
        .children_ordered(&IssueId::new(&args.issue_id))
        .await?;
    emit(output_mode, &children, |w, config| {
        output::write_issue_list(w, &children, "No children", config)
    })
}

/// Execute the reorder command
pub async fn execute_reorder(app: &App, args: &ReorderArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let parent = IssueId::new(&args.parent);
    let ordered: Vec<IssueId> = args.children.iter().map(IssueId::new).collect();

    let updated = engine.reorder_children(&parent, &ordered).await?;
    app.save().await?;

    let children = engine.children_ordered(&parent).await?;
    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "updated": updated,
            "children": children,
        }))?,
        OutputMode::Text => output::print_text(|w, config| {
            use std::io::Write;
            writeln!(
                w,
                "{} {updated} child edge(s)",
                output::success("Reordered", config)
            )?;
            output::write_issue_list(w, &children, "No children", config)
        })?,
    }
    Ok(())
}

/// Execute the eligible command
pub async fn execute_eligible(app: &App, args: &EligibleArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let (candidates, empty_message) = match &args.action {
        EligibleAction::Parents { issue_id } => (
            engine.eligible_parents(&IssueId::new(issue_id)).await?,
            "No eligible parents",
        ),
        EligibleAction::Children { issue_id } => (
            engine.eligible_children(&IssueId::new(issue_id)).await?,
            "No eligible children",
        ),
    };
    emit(output_mode, &candidates, |w, config| {
        output::write_issue_list(w, &candidates, empty_message, config)
    })
}

/// Execute the import command
pub async fn execute_import(app: &App, args: &ImportArgs, output_mode: OutputMode) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let doc = parse_document(&text);

    if args.validate_only || !doc.is_valid() {
        emit(output_mode, &doc, |w, config| {
            output::write_parsed_document(w, &doc, config)
        })?;
        if !doc.is_valid() {
            return Err(Error::ValidationFailed {
                errors: doc.errors.iter().map(ToString::to_string).collect(),
            }
            .into());
        }
        return Ok(());
    }

    let report = app.engine().import_document(&doc).await?;
    app.save().await?;

    emit(output_mode, &report, |w, config| {
        output::write_import_report(w, &report, config)
    })
}
