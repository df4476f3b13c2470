//! Cycle guard.
//!
//! Acyclicity is enforced per edge type: a `blocks` edge is only checked
//! against other `blocks` edges, a `parent-child` edge against the
//! containment forest. A cycle that alternates between types is not
//! detected.

use super::Engine;
use crate::domain::{DependencyType, IssueId};
use crate::error::Result;
use crate::storage::GraphSession;
use std::collections::{HashSet, VecDeque};

/// Whether adding `from -> to` would close a cycle among edges whose type is
/// in `scope`.
///
/// Breadth-first search from `to` along outgoing edges; reaching `from`
/// means the new edge would complete a loop. A self-edge is always a cycle.
///
/// # Errors
///
/// Only storage failures are reported; the answer itself is the `bool`.
pub async fn would_create_cycle(
    session: &dyn GraphSession,
    from: &IssueId,
    to: &IssueId,
    scope: &[DependencyType],
) -> Result<bool> {
    if from == to {
        return Ok(true);
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([to.clone()]);

    while let Some(current) = queue.pop_front() {
        if &current == from {
            return Ok(true);
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        for edge in session.edges_from(&current, scope).await? {
            if !visited.contains(&edge.depends_on_id) {
                queue.push_back(edge.depends_on_id);
            }
        }
    }

    Ok(false)
}

impl Engine {
    /// Read-only cycle check against the current graph.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the session cannot be opened.
    pub async fn would_create_cycle(
        &self,
        from: &IssueId,
        to: &IssueId,
        scope: &[DependencyType],
    ) -> Result<bool> {
        let session = self.begin().await?;
        would_create_cycle(session.as_ref(), from, to, scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewIssue;
    use crate::storage::in_memory::InMemoryStore;
    use std::sync::Arc;

    async fn chain(engine: &Engine, n: usize, dep_type: DependencyType) -> Vec<IssueId> {
        let mut ids = Vec::new();
        for i in 0..n {
            let issue = engine
                .create_issue(NewIssue::new(format!("Issue {i}")))
                .await
                .unwrap();
            ids.push(issue.id);
        }
        for pair in ids.windows(2) {
            engine
                .add_dependency(&pair[0], &pair[1], dep_type)
                .await
                .unwrap();
        }
        ids
    }

    #[tokio::test]
    async fn test_self_edge_is_a_cycle() {
        let engine = Engine::new(Arc::new(InMemoryStore::new("c")));
        let ids = chain(&engine, 1, DependencyType::Blocks).await;

        assert!(engine
            .would_create_cycle(&ids[0], &ids[0], &[DependencyType::Blocks])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_closing_edge_is_detected_within_scope() {
        let engine = Engine::new(Arc::new(InMemoryStore::new("c")));
        let ids = chain(&engine, 3, DependencyType::Blocks).await;

        assert!(engine
            .would_create_cycle(&ids[2], &ids[0], &[DependencyType::Blocks])
            .await
            .unwrap());
        // the reverse direction only extends the chain
        assert!(!engine
            .would_create_cycle(&ids[0], &ids[2], &[DependencyType::Blocks])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_other_edge_types_are_out_of_scope() {
        let engine = Engine::new(Arc::new(InMemoryStore::new("c")));
        let ids = chain(&engine, 3, DependencyType::Related).await;

        assert!(!engine
            .would_create_cycle(&ids[2], &ids[0], &[DependencyType::Blocks])
            .await
            .unwrap());
        assert!(engine
            .would_create_cycle(&ids[2], &ids[0], &DependencyType::ALL)
            .await
            .unwrap());
    }
}
