//! Parent/child type rules and sibling ordering.
//!
//! | parent  | allowed children               |
//! |---------|--------------------------------|
//! | epic    | feature, task, bug, chore      |
//! | feature | task, feature                  |
//! | task    | task, chore                    |
//! | bug     | task                           |
//! | chore   | task, chore                    |
//!
//! A child has at most one parent. `parent-child` edges point from the child
//! to the parent.

use super::cycle::would_create_cycle;
use super::{Engine, require_issue};
use crate::domain::{DependencyType, Issue, IssueId, IssueType};
use crate::error::{Error, Result};
use crate::storage::GraphSession;
use tracing::debug;

const PARENT_CHILD: &[DependencyType] = &[DependencyType::ParentChild];

/// Child types a parent of type `parent` may contain
pub fn allowed_children(parent: IssueType) -> &'static [IssueType] {
    use IssueType::{Bug, Chore, Epic, Feature, Task};

    match parent {
        Epic => &[Feature, Task, Bug, Chore],
        Feature => &[Task, Feature],
        Task => &[Task, Chore],
        Bug => &[Task],
        Chore => &[Task, Chore],
    }
}

/// Whether an issue of type `child` may be placed under one of type `parent`
pub fn is_valid_parent_child(parent: IssueType, child: IssueType) -> bool {
    allowed_children(parent).contains(&child)
}

/// String form of [`is_valid_parent_child`]. Names are case-insensitive; an
/// unknown parent type allows nothing and an unknown child type is never
/// allowed.
pub fn is_valid_parent_child_str(parent: &str, child: &str) -> bool {
    match (parent.parse::<IssueType>(), child.parse::<IssueType>()) {
        (Ok(parent), Ok(child)) => is_valid_parent_child(parent, child),
        _ => false,
    }
}

/// Check that `child` may gain `parent` as its parent.
///
/// Rejects incompatible types and a child that already has a different
/// parent. Cycle checking is done separately by the caller.
pub(crate) async fn check_parent_child(
    session: &dyn GraphSession,
    parent: &Issue,
    child: &Issue,
) -> Result<()> {
    if !is_valid_parent_child(parent.issue_type, child.issue_type) {
        return Err(Error::HierarchyViolation {
            parent: parent.id.clone(),
            child: child.id.clone(),
            detail: format!(
                "a {} cannot contain a {}",
                parent.issue_type, child.issue_type
            ),
        });
    }

    let existing = session.edges_from(&child.id, PARENT_CHILD).await?;
    if let Some(other) = existing.iter().find(|e| e.depends_on_id != parent.id) {
        return Err(Error::HierarchyViolation {
            parent: parent.id.clone(),
            child: child.id.clone(),
            detail: format!("already a child of {}", other.depends_on_id),
        });
    }

    Ok(())
}

/// The parent of `id`, if it has one
pub(crate) async fn parent_of(session: &dyn GraphSession, id: &IssueId) -> Result<Option<Issue>> {
    match session.edges_from(id, PARENT_CHILD).await?.into_iter().next() {
        Some(edge) => session.get_issue(&edge.depends_on_id).await,
        None => Ok(None),
    }
}

/// Children of `parent`, sorted by `(child_order, created_at)`
pub(crate) async fn children_ordered(
    session: &dyn GraphSession,
    parent: &IssueId,
) -> Result<Vec<Issue>> {
    let mut edges = session.edges_to(parent, PARENT_CHILD).await?;
    // stable: edges created in the same instant keep insertion order
    edges.sort_by_key(|e| (e.child_order, e.created_at));

    let mut children = Vec::with_capacity(edges.len());
    for edge in edges {
        if let Some(child) = session.get_issue(&edge.issue_id).await? {
            children.push(child);
        }
    }
    Ok(children)
}

impl Engine {
    /// Issues that `id` could be placed under.
    ///
    /// Empty when `id` already has a parent. Otherwise every other issue
    /// whose type may contain `id`'s type and that is not below `id` in the
    /// containment forest, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn eligible_parents(&self, id: &IssueId) -> Result<Vec<Issue>> {
        let session = self.begin().await?;
        let session = session.as_ref();
        let child = require_issue(session, id).await?;

        if !session.edges_from(id, PARENT_CHILD).await?.is_empty() {
            return Ok(Vec::new());
        }

        let mut eligible = Vec::new();
        for candidate in session.list_issues().await? {
            if candidate.id == child.id
                || !is_valid_parent_child(candidate.issue_type, child.issue_type)
            {
                continue;
            }
            if would_create_cycle(session, &child.id, &candidate.id, PARENT_CHILD).await? {
                continue;
            }
            eligible.push(candidate);
        }
        Ok(eligible)
    }

    /// Issues that could be placed under `id`.
    ///
    /// Candidates have no parent yet, have a type `id` may contain, and are
    /// not above `id` in the containment forest. Creation order.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn eligible_children(&self, id: &IssueId) -> Result<Vec<Issue>> {
        let session = self.begin().await?;
        let session = session.as_ref();
        let parent = require_issue(session, id).await?;

        let mut eligible = Vec::new();
        for candidate in session.list_issues().await? {
            if candidate.id == parent.id
                || !is_valid_parent_child(parent.issue_type, candidate.issue_type)
            {
                continue;
            }
            if !session.edges_from(&candidate.id, PARENT_CHILD).await?.is_empty() {
                continue;
            }
            if would_create_cycle(session, &candidate.id, &parent.id, PARENT_CHILD).await? {
                continue;
            }
            eligible.push(candidate);
        }
        Ok(eligible)
    }

    /// Parent of `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `id` doesn't exist.
    pub async fn parent_of(&self, id: &IssueId) -> Result<Option<Issue>> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;
        parent_of(session.as_ref(), id).await
    }

    /// Set `child_order` of each listed child to its position in `ordered`.
    ///
    /// Ids that are not children of `parent` are ignored and siblings that
    /// are not listed keep their current value. Returns how many edges were
    /// updated.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `parent` doesn't exist.
    pub async fn reorder_children(&self, parent: &IssueId, ordered: &[IssueId]) -> Result<usize> {
        let mut session = self.begin().await?;
        require_issue(session.as_ref(), parent).await?;

        let mut updated = 0;
        for (position, child) in ordered.iter().enumerate() {
            let order = u32::try_from(position)
                .map_err(|_| Error::InvalidInput("too many children to order".to_string()))?;
            if session.set_child_order(child, parent, order).await? {
                updated += 1;
            } else {
                debug!(parent = %parent, child = %child, "reorder: not a child, ignored");
            }
        }

        session.commit()?;
        debug!(parent = %parent, updated, "reordered children");
        Ok(updated)
    }

    /// Children of `parent` sorted by `(child_order, created_at)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if `parent` doesn't exist.
    pub async fn children_ordered(&self, parent: &IssueId) -> Result<Vec<Issue>> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), parent).await?;
        children_ordered(session.as_ref(), parent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewIssue;
    use crate::error::ErrorKind;
    use crate::storage::in_memory::InMemoryStore;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(IssueType::Epic, IssueType::Feature, true)]
    #[case(IssueType::Epic, IssueType::Bug, true)]
    #[case(IssueType::Epic, IssueType::Epic, false)]
    #[case(IssueType::Feature, IssueType::Feature, true)]
    #[case(IssueType::Feature, IssueType::Bug, false)]
    #[case(IssueType::Task, IssueType::Task, true)]
    #[case(IssueType::Task, IssueType::Chore, true)]
    #[case(IssueType::Task, IssueType::Epic, false)]
    #[case(IssueType::Bug, IssueType::Task, true)]
    #[case(IssueType::Bug, IssueType::Bug, false)]
    #[case(IssueType::Chore, IssueType::Chore, true)]
    #[case(IssueType::Chore, IssueType::Feature, false)]
    fn test_hierarchy_table(
        #[case] parent: IssueType,
        #[case] child: IssueType,
        #[case] allowed: bool,
    ) {
        assert_eq!(is_valid_parent_child(parent, child), allowed);
    }

    #[rstest]
    #[case("EPIC", "task", true)]
    #[case("Feature", "FEATURE", true)]
    #[case("story", "task", false)]
    #[case("epic", "story", false)]
    fn test_hierarchy_table_by_name(
        #[case] parent: &str,
        #[case] child: &str,
        #[case] allowed: bool,
    ) {
        assert_eq!(is_valid_parent_child_str(parent, child), allowed);
    }

    fn engine() -> Engine {
        Engine::new(Arc::new(InMemoryStore::new("h")))
    }

    async fn make(engine: &Engine, title: &str, issue_type: IssueType) -> Issue {
        engine
            .create_issue(NewIssue::new(title).with_type(issue_type))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_task_under_task_accepted_epic_under_task_rejected() {
        let engine = engine();
        let parent = make(&engine, "Parent", IssueType::Task).await;
        let task = make(&engine, "Child", IssueType::Task).await;
        let epic = make(&engine, "Epic", IssueType::Epic).await;

        engine
            .add_dependency(&task.id, &parent.id, DependencyType::ParentChild)
            .await
            .unwrap();

        let err = engine
            .add_dependency(&epic.id, &parent.id, DependencyType::ParentChild)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HierarchyViolation);
        assert!(engine.get_dependencies(&epic.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_parent_rejected() {
        let engine = engine();
        let first = make(&engine, "First", IssueType::Feature).await;
        let second = make(&engine, "Second", IssueType::Feature).await;
        let task = make(&engine, "Task", IssueType::Task).await;

        engine
            .add_dependency(&task.id, &first.id, DependencyType::ParentChild)
            .await
            .unwrap();
        let err = engine
            .add_dependency(&task.id, &second.id, DependencyType::ParentChild)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HierarchyViolation);
    }

    #[tokio::test]
    async fn test_eligible_parents_filters_type_and_descendants() {
        let engine = engine();
        let epic = make(&engine, "Epic", IssueType::Epic).await;
        let feature = make(&engine, "Feature", IssueType::Feature).await;
        let sub = make(&engine, "Sub-feature", IssueType::Feature).await;
        let _bug = make(&engine, "Bug", IssueType::Bug).await;

        engine
            .add_dependency(&sub.id, &feature.id, DependencyType::ParentChild)
            .await
            .unwrap();

        let ids: Vec<IssueId> = engine
            .eligible_parents(&feature.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        // the sub-feature is below the feature; bugs cannot hold features
        assert_eq!(ids, vec![epic.id.clone()]);

        // already parented
        assert!(engine.eligible_parents(&sub.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_eligible_children_skips_parented_and_ancestors() {
        let engine = engine();
        let outer = make(&engine, "Outer", IssueType::Feature).await;
        let inner = make(&engine, "Inner", IssueType::Feature).await;
        let free = make(&engine, "Free", IssueType::Task).await;
        let taken = make(&engine, "Taken", IssueType::Task).await;
        let _epic = make(&engine, "Epic", IssueType::Epic).await;

        engine
            .add_dependency(&inner.id, &outer.id, DependencyType::ParentChild)
            .await
            .unwrap();
        engine
            .add_dependency(&taken.id, &outer.id, DependencyType::ParentChild)
            .await
            .unwrap();

        let ids: Vec<IssueId> = engine
            .eligible_children(&inner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![free.id.clone()]);
    }

    #[tokio::test]
    async fn test_reorder_then_children_ordered() {
        let engine = engine();
        let parent = make(&engine, "P", IssueType::Epic).await;
        let c1 = make(&engine, "C1", IssueType::Task).await;
        let c2 = make(&engine, "C2", IssueType::Task).await;
        let stranger = make(&engine, "S", IssueType::Task).await;

        for child in [&c1, &c2] {
            engine
                .add_dependency(&child.id, &parent.id, DependencyType::ParentChild)
                .await
                .unwrap();
        }

        let before: Vec<IssueId> = engine
            .children_ordered(&parent.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(before, vec![c1.id.clone(), c2.id.clone()]);

        let updated = engine
            .reorder_children(&parent.id, &[c2.id.clone(), stranger.id.clone(), c1.id.clone()])
            .await
            .unwrap();
        assert_eq!(updated, 2);

        let after: Vec<IssueId> = engine
            .children_ordered(&parent.id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(after, vec![c2.id, c1.id]);
    }
}
