//! Why is this issue blocked?
//!
//! Breadth-first search from the issue along `blocks` and `parent-child`
//! edges for the nearest open issue. The first one dequeued ends the search,
//! so the returned chain is a shortest one. Closed issues are dead ends;
//! in-progress and blocked issues are walked through.

use super::{Engine, require_issue};
use crate::domain::{DependencyType, Issue, IssueId, IssueStatus};
use crate::error::Result;
use std::collections::{HashSet, VecDeque};

/// Longest chain the search will follow
pub const MAX_BLOCKING_DEPTH: usize = 50;

const BLOCKING_TYPES: &[DependencyType] = &[DependencyType::Blocks, DependencyType::ParentChild];

impl Engine {
    /// Chain from `id` to its nearest open blocker, both ends included.
    ///
    /// Empty when no open issue is reachable.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn find_blocking_path(&self, id: &IssueId) -> Result<Vec<Issue>> {
        let session = self.begin().await?;
        let session = session.as_ref();
        require_issue(session, id).await?;

        let mut visited = HashSet::new();
        let mut queue: VecDeque<(IssueId, Vec<Issue>)> = VecDeque::from([(id.clone(), Vec::new())]);

        while let Some((current_id, path)) = queue.pop_front() {
            if !visited.insert(current_id.clone()) {
                continue;
            }
            let Some(current) = session.get_issue(&current_id).await? else {
                continue;
            };

            match current.status {
                IssueStatus::Open if !path.is_empty() => {
                    let mut chain = path;
                    chain.push(current);
                    return Ok(chain);
                }
                IssueStatus::Closed => continue,
                _ => {}
            }

            if path.len() >= MAX_BLOCKING_DEPTH {
                continue;
            }

            let edges = session.edges_from(&current_id, BLOCKING_TYPES).await?;
            let mut next_path = path;
            next_path.push(current);
            for edge in edges {
                if !visited.contains(&edge.depends_on_id) {
                    queue.push_back((edge.depends_on_id, next_path.clone()));
                }
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueType, NewIssue};
    use crate::storage::in_memory::InMemoryStore;
    use std::sync::Arc;

    fn engine() -> Engine {
        Engine::new(Arc::new(InMemoryStore::new("b")))
    }

    fn ids(issues: &[Issue]) -> Vec<IssueId> {
        issues.iter().map(|i| i.id.clone()).collect()
    }

    async fn blocks(engine: &Engine, from: &Issue, to: &Issue) {
        engine
            .add_dependency(&from.id, &to.id, DependencyType::Blocks)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stops_at_nearest_open_blocker() {
        let engine = engine();
        let x = engine.create_issue(NewIssue::new("X")).await.unwrap();
        let y = engine.create_issue(NewIssue::new("Y")).await.unwrap();
        let z = engine.create_issue(NewIssue::new("Z")).await.unwrap();
        blocks(&engine, &x, &y).await;
        blocks(&engine, &y, &z).await;

        let path = engine.find_blocking_path(&x.id).await.unwrap();
        assert_eq!(ids(&path), vec![x.id, y.id]);
    }

    #[tokio::test]
    async fn test_closed_blocker_yields_empty_path() {
        let engine = engine();
        let x = engine.create_issue(NewIssue::new("X")).await.unwrap();
        let y = engine.create_issue(NewIssue::new("Y")).await.unwrap();
        blocks(&engine, &x, &y).await;
        engine.close(&y.id, None).await.unwrap();

        assert!(engine.find_blocking_path(&x.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_walks_through_in_progress_issues() {
        let engine = engine();
        let x = engine.create_issue(NewIssue::new("X")).await.unwrap();
        let y = engine.create_issue(NewIssue::new("Y")).await.unwrap();
        let z = engine.create_issue(NewIssue::new("Z")).await.unwrap();
        blocks(&engine, &x, &y).await;
        blocks(&engine, &y, &z).await;
        engine.start(&y.id, None).await.unwrap();

        let path = engine.find_blocking_path(&x.id).await.unwrap();
        assert_eq!(ids(&path), vec![x.id, y.id, z.id]);
    }

    #[tokio::test]
    async fn test_follows_parent_edges() {
        let engine = engine();
        let epic = engine
            .create_issue(NewIssue::new("Epic").with_type(IssueType::Epic))
            .await
            .unwrap();
        let task = engine.create_issue(NewIssue::new("Task")).await.unwrap();
        engine
            .add_dependency(&task.id, &epic.id, DependencyType::ParentChild)
            .await
            .unwrap();

        let path = engine.find_blocking_path(&task.id).await.unwrap();
        assert_eq!(ids(&path), vec![task.id, epic.id]);
    }

    /// `len` in-progress issues, each blocked by the next, ending at an open one
    async fn in_progress_chain(engine: &Engine, len: usize) -> Vec<Issue> {
        let mut chain = Vec::with_capacity(len + 1);
        for n in 0..=len {
            let issue = engine
                .create_issue(NewIssue::new(format!("Link {n}")))
                .await
                .unwrap();
            if n < len {
                engine.start(&issue.id, None).await.unwrap();
            }
            if let Some(prev) = chain.last() {
                blocks(engine, prev, &issue).await;
            }
            chain.push(issue);
        }
        chain
    }

    #[tokio::test]
    async fn test_open_blocker_at_depth_limit_is_found() {
        let engine = engine();
        let chain = in_progress_chain(&engine, MAX_BLOCKING_DEPTH).await;

        let path = engine.find_blocking_path(&chain[0].id).await.unwrap();
        assert_eq!(path.len(), MAX_BLOCKING_DEPTH + 1);
        assert_eq!(path.last().map(|i| &i.id), chain.last().map(|i| &i.id));
    }

    #[tokio::test]
    async fn test_open_blocker_past_depth_limit_is_ignored() {
        let engine = engine();
        let chain = in_progress_chain(&engine, MAX_BLOCKING_DEPTH + 2).await;

        assert!(engine.find_blocking_path(&chain[0].id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_issue_is_not_found() {
        let engine = engine();
        assert!(engine
            .find_blocking_path(&IssueId::new("b-none"))
            .await
            .is_err());
    }
}
