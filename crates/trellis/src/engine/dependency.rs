//! Adding, removing and listing edges.
//!
//! Every insertion, including the ones made by the importer, goes through
//! [`insert_edge_checked`]:
//!
//! 1. both endpoints must exist
//! 2. an identical `(from, to, type)` edge is returned as-is
//! 3. the cycle guard runs with the edge's own type as scope
//! 4. `parent-child` edges are checked against the hierarchy rules

use super::cycle::would_create_cycle;
use super::hierarchy::check_parent_child;
use super::{Engine, require_issue};
use crate::domain::{
    DependencyEdge, DependencyTree, DependencyType, EventKind, IssueId, NewEvent,
};
use crate::error::{Error, Result};
use crate::storage::GraphSession;
use chrono::Utc;
use futures::future::BoxFuture;
use std::collections::HashSet;
use tracing::debug;

/// Depth used by tree queries when the caller has no preference
pub const DEFAULT_TREE_DEPTH: usize = 10;

/// Insert `from -> to` of `dep_type` with every invariant checked.
///
/// Returns the stored edge and whether it was newly created.
pub(crate) async fn insert_edge_checked(
    session: &mut dyn GraphSession,
    from: &IssueId,
    to: &IssueId,
    dep_type: DependencyType,
    actor: &str,
) -> Result<(DependencyEdge, bool)> {
    let source = require_issue(&*session, from).await?;
    let target = require_issue(&*session, to).await?;

    if let Some(existing) = session.find_edge(from, to, dep_type).await? {
        return Ok((existing, false));
    }

    if would_create_cycle(&*session, from, to, &[dep_type]).await? {
        return Err(Error::CycleRejected {
            from: from.clone(),
            to: to.clone(),
            dep_type,
        });
    }

    if dep_type == DependencyType::ParentChild {
        check_parent_child(&*session, &target, &source).await?;
    }

    let edge = DependencyEdge {
        issue_id: from.clone(),
        depends_on_id: to.clone(),
        dep_type,
        child_order: 0,
        created_by: actor.to_string(),
        created_at: Utc::now(),
    };
    session.insert_edge(edge.clone()).await?;
    session
        .record_event(
            NewEvent::new(from.clone(), EventKind::DependencyAdded, actor)
                .values(None, Some(format!("{dep_type}:{to}"))),
        )
        .await?;

    debug!(from = %from, to = %to, dep_type = %dep_type, "added dependency");
    Ok((edge, true))
}

/// Build one tree node, recursing into outgoing edges.
///
/// `visited` holds the ids on the path from the root to this node; each
/// branch gets its own copy, so diamonds expand on every branch while loops
/// stop with `circular: true`.
fn build_tree<'a>(
    session: &'a dyn GraphSession,
    id: IssueId,
    dep_type: Option<DependencyType>,
    depth: usize,
    max_depth: usize,
    mut visited: HashSet<IssueId>,
) -> BoxFuture<'a, Result<DependencyTree>> {
    Box::pin(async move {
        let issue = session.get_issue(&id).await?;
        let mut node = DependencyTree {
            issue_id: id.clone(),
            dep_type,
            title: issue.as_ref().map(|i| i.title.clone()),
            status: issue.as_ref().map(|i| i.status),
            circular: false,
            truncated: false,
            dependencies: Vec::new(),
        };

        if visited.contains(&id) {
            node.circular = true;
            return Ok(node);
        }

        let edges = session.edges_from(&id, &DependencyType::ALL).await?;
        if depth >= max_depth {
            node.truncated = !edges.is_empty();
            return Ok(node);
        }

        visited.insert(id);
        for edge in edges {
            let child = build_tree(
                session,
                edge.depends_on_id,
                Some(edge.dep_type),
                depth + 1,
                max_depth,
                visited.clone(),
            )
            .await?;
            node.dependencies.push(child);
        }
        Ok(node)
    })
}

impl Engine {
    /// Add an edge; `from` depends on (or is a child of) `to`.
    ///
    /// Adding an edge that already exists returns the stored edge.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if either issue doesn't exist
    /// - `Error::CycleRejected` if the edge would close a same-type cycle
    /// - `Error::HierarchyViolation` for an incompatible or second parent
    pub async fn add_dependency(
        &self,
        from: &IssueId,
        to: &IssueId,
        dep_type: DependencyType,
    ) -> Result<DependencyEdge> {
        let mut session = self.begin().await?;
        let (edge, _) = insert_edge_checked(session.as_mut(), from, to, dep_type, self.actor()).await?;
        session.commit()?;
        Ok(edge)
    }

    /// Remove the edge(s) from `from` to `to`.
    ///
    /// With a type only that edge is removed; without one, every edge
    /// between the pair goes. Returns what was removed.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if either issue doesn't exist
    /// - `Error::DependencyNotFound` if nothing matched
    pub async fn remove_dependency(
        &self,
        from: &IssueId,
        to: &IssueId,
        dep_type: Option<DependencyType>,
    ) -> Result<Vec<DependencyEdge>> {
        let mut session = self.begin().await?;
        require_issue(session.as_ref(), from).await?;
        require_issue(session.as_ref(), to).await?;

        let types = match dep_type {
            Some(dep_type) => vec![dep_type],
            None => DependencyType::ALL.to_vec(),
        };

        let mut removed = Vec::new();
        for dep_type in types {
            if let Some(edge) = session.remove_edge(from, to, dep_type).await? {
                session
                    .record_event(
                        NewEvent::new(from.clone(), EventKind::DependencyRemoved, self.actor())
                            .values(Some(format!("{dep_type}:{to}")), None),
                    )
                    .await?;
                removed.push(edge);
            }
        }

        if removed.is_empty() {
            return Err(Error::DependencyNotFound {
                from: from.clone(),
                to: to.clone(),
            });
        }

        session.commit()?;
        debug!(from = %from, to = %to, count = removed.len(), "removed dependency");
        Ok(removed)
    }

    /// Outgoing edges of `id` (what it depends on), all types.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn get_dependencies(&self, id: &IssueId) -> Result<Vec<DependencyEdge>> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;
        session.edges_from(id, &DependencyType::ALL).await
    }

    /// Incoming edges of `id` (what depends on it), all types.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn get_dependents(&self, id: &IssueId) -> Result<Vec<DependencyEdge>> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;
        session.edges_to(id, &DependencyType::ALL).await
    }

    /// Transitive dependencies of `id` as a tree, at most `max_depth` edges
    /// deep.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn get_dependency_tree(&self, id: &IssueId, max_depth: usize) -> Result<DependencyTree> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;
        build_tree(session.as_ref(), id.clone(), None, 0, max_depth, HashSet::new()).await
    }
}
