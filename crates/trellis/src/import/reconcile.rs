//! Applying a parsed document to the store.
//!
//! The whole import runs in one session. Pass 1 overwrites the item carrying
//! each logical id, or creates it. Pass 2 adds the nesting edges and the
//! `deps=` edges through the same checked insertion path as
//! [`Engine::add_dependency`]. An edge the graph refuses is reported as a
//! [`ImportWarning::SkippedEdge`] and the import carries on.

use super::{ImportReport, ImportWarning, ParsedDocument, ParsedItem};
use crate::domain::{DependencyType, EventKind, IssueId, IssueUpdate, NewEvent, NewIssue};
use crate::engine::Engine;
use crate::engine::dependency::insert_edge_checked;
use crate::error::{Error, ErrorKind, Result};
use crate::storage::GraphSession;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

/// Actor recorded on everything the importer writes
pub const IMPORT_ACTOR: &str = "import";

impl Engine {
    /// Merge a parsed document into the graph.
    ///
    /// Items are matched on their logical id: a match is overwritten in
    /// place (status untouched), anything else is created. A child's
    /// dependency on its own parent is dropped with a warning, since the
    /// nesting edge already relates the two.
    ///
    /// # Errors
    ///
    /// - `Error::ValidationFailed` if the document has any error; nothing is
    ///   written
    /// - storage errors abort the import and leave the store unchanged
    pub async fn import_document(&self, doc: &ParsedDocument) -> Result<ImportReport> {
        if !doc.is_valid() {
            return Err(Error::ValidationFailed {
                errors: doc.errors.iter().map(ToString::to_string).collect(),
            });
        }

        let mut session = self.begin().await?;
        let mut report = ImportReport {
            logical_ids_processed: doc.items.len(),
            warnings: doc.warnings.clone(),
            ..ImportReport::default()
        };

        let mut storage_ids: HashMap<&str, IssueId> = HashMap::new();
        for item in &doc.items {
            let (id, created) = upsert_item(session.as_mut(), item).await?;
            if created {
                report.created += 1;
            } else {
                report.updated += 1;
            }
            storage_ids.insert(item.logical_id.as_str(), id);
        }

        for item in &doc.items {
            let Some(from) = storage_ids.get(item.logical_id.as_str()) else {
                continue;
            };

            if let Some(parent) = &item.parent {
                if let Some(to) = storage_ids.get(parent.as_str()) {
                    let link = Link {
                        from_logical: &item.logical_id,
                        to_logical: parent,
                        from,
                        to,
                        dep_type: DependencyType::ParentChild,
                    };
                    link.insert(session.as_mut(), &mut report).await?;
                }
            }

            for dep in &item.dependencies {
                let Some(to) = storage_ids.get(dep.as_str()) else {
                    continue;
                };
                if to == from {
                    continue;
                }
                if item.parent.as_ref() == Some(dep) {
                    report.warnings.push(ImportWarning::RedundantParentDependency {
                        logical_id: item.logical_id.clone(),
                        dependency: dep.clone(),
                    });
                    continue;
                }
                let link = Link {
                    from_logical: &item.logical_id,
                    to_logical: dep,
                    from,
                    to,
                    dep_type: DependencyType::Blocks,
                };
                link.insert(session.as_mut(), &mut report).await?;
            }
        }

        session.commit()?;

        info!(
            created = report.created,
            updated = report.updated,
            edges_created = report.edges_created,
            warnings = report.warnings.len(),
            "imported document"
        );
        Ok(report)
    }
}

/// Overwrite the item with `item.logical_id`, or create it.
///
/// Returns its storage id and whether it was created.
async fn upsert_item(session: &mut dyn GraphSession, item: &ParsedItem) -> Result<(IssueId, bool)> {
    if let Some(mut existing) = session.find_by_logical_id(&item.logical_id).await? {
        let update = IssueUpdate {
            title: Some(item.title.clone()),
            description: Some(item.description.clone()),
            design: Some(item.design.clone()),
            acceptance_criteria: Some(item.acceptance_criteria.clone()),
            notes: Some(item.notes.clone()),
            priority: Some(item.priority),
            issue_type: Some(item.issue_type),
            assignee: Some(item.assignee.clone()),
            estimated_minutes: Some(item.estimated_minutes),
            logical_id: None,
        };
        if update.apply_to(&mut existing) {
            existing.updated_at = Utc::now();
            session.put_issue(existing.clone()).await?;
            session
                .record_event(NewEvent::new(
                    existing.id.clone(),
                    EventKind::Updated,
                    IMPORT_ACTOR,
                ))
                .await?;
        }
        return Ok((existing.id, false));
    }

    let new_issue = NewIssue {
        title: item.title.clone(),
        description: item.description.clone(),
        design: item.design.clone(),
        acceptance_criteria: item.acceptance_criteria.clone(),
        notes: item.notes.clone(),
        priority: item.priority,
        issue_type: item.issue_type,
        assignee: item.assignee.clone(),
        estimated_minutes: item.estimated_minutes,
        logical_id: Some(item.logical_id.clone()),
    };
    let issue = session.create_issue(new_issue, IMPORT_ACTOR).await?;
    session
        .record_event(
            NewEvent::new(issue.id.clone(), EventKind::Created, IMPORT_ACTOR)
                .values(None, Some(issue.title.clone())),
        )
        .await?;
    Ok((issue.id, true))
}

/// One edge to materialise in pass 2
struct Link<'a> {
    from_logical: &'a str,
    to_logical: &'a str,
    from: &'a IssueId,
    to: &'a IssueId,
    dep_type: DependencyType,
}

impl Link<'_> {
    /// Insert the edge, turning graph-rule refusals into warnings
    async fn insert(self, session: &mut dyn GraphSession, report: &mut ImportReport) -> Result<()> {
        match insert_edge_checked(session, self.from, self.to, self.dep_type, IMPORT_ACTOR).await {
            Ok((_, true)) => report.edges_created += 1,
            Ok((_, false)) => {}
            Err(err) if err.kind() == ErrorKind::Storage => return Err(err),
            Err(err) => {
                warn!(
                    from = self.from_logical,
                    to = self.to_logical,
                    dep_type = %self.dep_type,
                    error = %err,
                    "skipped edge during import"
                );
                report.warnings.push(ImportWarning::SkippedEdge {
                    from: self.from_logical.to_string(),
                    to: self.to_logical.to_string(),
                    dep_type: self.dep_type,
                    reason: err.to_string(),
                });
            }
        }
        Ok(())
    }
}
