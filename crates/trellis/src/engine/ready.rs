//! The ready set.
//!
//! An issue is ready when its status is open or in progress and
//!
//! 1. every direct child (incoming `parent-child` edge) is closed, and
//! 2. every `blocks` target (outgoing `blocks` edge) is closed.
//!
//! A parent never blocks its children and `related` edges are ignored. Only
//! direct children are examined; grandchildren matter only through their
//! own parent's status.

use super::{Engine, require_issue};
use crate::domain::{BlockedIssue, DependencyType, Issue, IssueFilter, IssueId, IssueStatus};
use crate::error::Result;
use crate::storage::GraphSession;
use tracing::debug;

/// What keeps one issue out of the ready set
#[derive(Debug, Default)]
struct Obstacles {
    blockers: Vec<Issue>,
    open_children: Vec<Issue>,
}

impl Obstacles {
    fn is_clear(&self) -> bool {
        self.blockers.is_empty() && self.open_children.is_empty()
    }
}

async fn obstacles(session: &dyn GraphSession, issue: &Issue) -> Result<Obstacles> {
    let mut found = Obstacles::default();

    for edge in session
        .edges_to(&issue.id, &[DependencyType::ParentChild])
        .await?
    {
        if let Some(child) = session.get_issue(&edge.issue_id).await? {
            if child.status != IssueStatus::Closed {
                found.open_children.push(child);
            }
        }
    }

    for edge in session
        .edges_from(&issue.id, &[DependencyType::Blocks])
        .await?
    {
        if let Some(target) = session.get_issue(&edge.depends_on_id).await? {
            if target.status != IssueStatus::Closed {
                found.blockers.push(target);
            }
        }
    }

    Ok(found)
}

async fn is_ready(session: &dyn GraphSession, issue: &Issue) -> Result<bool> {
    Ok(issue.status.is_workable() && obstacles(session, issue).await?.is_clear())
}

impl Engine {
    /// Up to `limit` ready issues, most urgent first.
    ///
    /// Sorted by priority ascending; equal priorities keep creation order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the graph cannot be read.
    pub async fn ready(&self, limit: usize) -> Result<Vec<Issue>> {
        self.ready_matching(&IssueFilter {
            limit: Some(limit),
            ..IssueFilter::default()
        })
        .await
    }

    /// Ready issues that also pass `filter`, truncated to `filter.limit`.
    ///
    /// A status in the filter further narrows the workable statuses; it
    /// cannot make a blocked or closed issue ready.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the graph cannot be read.
    pub async fn ready_matching(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let session = self.begin().await?;
        let session = session.as_ref();

        let mut ready = Vec::new();
        for issue in session.list_issues().await? {
            if filter.matches(&issue) && is_ready(session, &issue).await? {
                ready.push(issue);
            }
        }

        // stable sort, and list_issues is already in creation order
        ready.sort_by_key(|issue| issue.priority);
        ready.drain(..filter.offset.min(ready.len()));
        if let Some(limit) = filter.limit {
            ready.truncate(limit);
        }

        debug!(count = ready.len(), "computed ready set");
        Ok(ready)
    }

    /// Whether a single issue is ready.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn is_ready(&self, id: &IssueId) -> Result<bool> {
        let session = self.begin().await?;
        let issue = require_issue(session.as_ref(), id).await?;
        is_ready(session.as_ref(), &issue).await
    }

    /// Non-closed issues that are not ready, with their open blockers and
    /// open children, in creation order.
    ///
    /// Issues with the `blocked` status appear even when nothing in the graph
    /// holds them back.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the graph cannot be read.
    pub async fn blocked(&self) -> Result<Vec<BlockedIssue>> {
        let session = self.begin().await?;
        let session = session.as_ref();

        let mut blocked = Vec::new();
        for issue in session.list_issues().await? {
            if issue.status == IssueStatus::Closed {
                continue;
            }
            let found = obstacles(session, &issue).await?;
            if found.is_clear() && issue.status != IssueStatus::Blocked {
                continue;
            }
            blocked.push(BlockedIssue {
                issue,
                blockers: found.blockers,
                open_children: found.open_children,
            });
        }
        Ok(blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueType, NewIssue};
    use crate::storage::in_memory::InMemoryStore;
    use std::sync::Arc;

    fn engine() -> Engine {
        Engine::new(Arc::new(InMemoryStore::new("r")))
    }

    fn ids(issues: &[Issue]) -> Vec<IssueId> {
        issues.iter().map(|i| i.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_priority_order_is_stable() {
        let engine = engine();
        let a = engine
            .create_issue(NewIssue::new("A").with_priority(0))
            .await
            .unwrap();
        let b = engine
            .create_issue(NewIssue::new("B").with_priority(1))
            .await
            .unwrap();
        let c = engine
            .create_issue(NewIssue::new("C").with_priority(0))
            .await
            .unwrap();

        let ready = engine.ready(10).await.unwrap();
        assert_eq!(ids(&ready), vec![a.id, c.id, b.id]);
    }

    #[tokio::test]
    async fn test_limit_truncates_after_sorting() {
        let engine = engine();
        for p in [3, 1, 2] {
            engine
                .create_issue(NewIssue::new(format!("P{p}")).with_priority(p))
                .await
                .unwrap();
        }

        let ready = engine.ready(2).await.unwrap();
        assert_eq!(
            ready.iter().map(|i| i.priority).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_parent_waits_for_children_but_children_do_not_wait_for_parent() {
        let engine = engine();
        let parent = engine
            .create_issue(NewIssue::new("Epic").with_type(IssueType::Epic))
            .await
            .unwrap();
        let child = engine.create_issue(NewIssue::new("Task")).await.unwrap();
        engine
            .add_dependency(&child.id, &parent.id, DependencyType::ParentChild)
            .await
            .unwrap();

        assert_eq!(ids(&engine.ready(10).await.unwrap()), vec![child.id.clone()]);
        assert!(!engine.is_ready(&parent.id).await.unwrap());

        engine.close(&child.id, None).await.unwrap();
        assert_eq!(ids(&engine.ready(10).await.unwrap()), vec![parent.id.clone()]);
    }

    #[tokio::test]
    async fn test_blocks_and_related_edges() {
        let engine = engine();
        let a = engine.create_issue(NewIssue::new("A")).await.unwrap();
        let b = engine.create_issue(NewIssue::new("B")).await.unwrap();
        let c = engine.create_issue(NewIssue::new("C")).await.unwrap();
        engine
            .add_dependency(&a.id, &b.id, DependencyType::Blocks)
            .await
            .unwrap();
        engine
            .add_dependency(&c.id, &b.id, DependencyType::Related)
            .await
            .unwrap();

        assert_eq!(
            ids(&engine.ready(10).await.unwrap()),
            vec![b.id.clone(), c.id.clone()]
        );

        engine.close(&b.id, None).await.unwrap();
        assert_eq!(ids(&engine.ready(10).await.unwrap()), vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_only_open_and_in_progress_are_ready() {
        let engine = engine();
        let open = engine.create_issue(NewIssue::new("Open")).await.unwrap();
        let started = engine.create_issue(NewIssue::new("Started")).await.unwrap();
        let held = engine.create_issue(NewIssue::new("Held")).await.unwrap();
        let done = engine.create_issue(NewIssue::new("Done")).await.unwrap();
        engine.start(&started.id, None).await.unwrap();
        engine.block(&held.id, None).await.unwrap();
        engine.close(&done.id, None).await.unwrap();

        assert_eq!(
            ids(&engine.ready(10).await.unwrap()),
            vec![open.id, started.id]
        );

        let blocked = engine.blocked().await.unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].issue.id, held.id);
    }

    #[tokio::test]
    async fn test_blocked_reports_obstacles() {
        let engine = engine();
        let parent = engine
            .create_issue(NewIssue::new("Feature").with_type(IssueType::Feature))
            .await
            .unwrap();
        let child = engine.create_issue(NewIssue::new("Child")).await.unwrap();
        let blocker = engine.create_issue(NewIssue::new("Blocker")).await.unwrap();
        engine
            .add_dependency(&child.id, &parent.id, DependencyType::ParentChild)
            .await
            .unwrap();
        engine
            .add_dependency(&parent.id, &blocker.id, DependencyType::Blocks)
            .await
            .unwrap();

        let blocked = engine.blocked().await.unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].issue.id, parent.id);
        assert_eq!(ids(&blocked[0].blockers), vec![blocker.id]);
        assert_eq!(ids(&blocked[0].open_children), vec![child.id]);
    }

    #[tokio::test]
    async fn test_ready_matching_applies_filter() {
        let engine = engine();
        engine.create_issue(NewIssue::new("Task")).await.unwrap();
        let bug = engine
            .create_issue(NewIssue::new("Bug").with_type(IssueType::Bug))
            .await
            .unwrap();

        let ready = engine
            .ready_matching(&IssueFilter {
                issue_type: Some(IssueType::Bug),
                ..IssueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&ready), vec![bug.id]);
    }
}
