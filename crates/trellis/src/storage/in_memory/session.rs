//! [`GraphSession`] implementation for the in-memory store.

use super::inner::{Inner, StoredEdge};
use crate::domain::{
    DependencyEdge, DependencyType, Event, Issue, IssueId, IssueStatus, NewEvent, NewIssue,
};
use crate::error::{Error, Result};
use crate::storage::GraphSession;
use async_trait::async_trait;
use chrono::Utc;
use petgraph::Direction;
use tokio::sync::OwnedMutexGuard;

/// Exclusive session over an [`Inner`].
///
/// Holds the store lock for its whole lifetime. Writes go to `staged`, a
/// copy taken on the first write; `commit` swaps it in and dropping the
/// session throws it away.
pub(crate) struct InMemorySession {
    guard: OwnedMutexGuard<Inner>,
    staged: Option<Inner>,
}

impl InMemorySession {
    pub(crate) fn new(guard: OwnedMutexGuard<Inner>) -> Self {
        Self {
            guard,
            staged: None,
        }
    }

    fn read(&self) -> &Inner {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    fn write(&mut self) -> &mut Inner {
        let guard = &self.guard;
        self.staged.get_or_insert_with(|| (**guard).clone())
    }
}

#[async_trait]
impl GraphSession for InMemorySession {
    async fn create_issue(&mut self, new_issue: NewIssue, actor: &str) -> Result<Issue> {
        new_issue.validate().map_err(Error::validation)?;

        let inner = self.write();
        let sequence = inner.next_sequence;
        let id = IssueId::new(
            inner
                .id_generator
                .generate(&new_issue.title, actor, sequence)?,
        );
        let now = Utc::now();

        let issue = Issue {
            id,
            title: new_issue.title,
            description: new_issue.description,
            design: new_issue.design,
            acceptance_criteria: new_issue.acceptance_criteria,
            notes: new_issue.notes,
            status: IssueStatus::Open,
            priority: new_issue.priority,
            issue_type: new_issue.issue_type,
            assignee: new_issue.assignee,
            estimated_minutes: new_issue.estimated_minutes,
            logical_id: new_issue.logical_id,
            sequence,
            created_by: actor.to_string(),
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        inner.upsert_issue(issue.clone());
        Ok(issue)
    }

    async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>> {
        Ok(self.read().issues.get(id).cloned())
    }

    async fn find_by_logical_id(&self, logical_id: &str) -> Result<Option<Issue>> {
        Ok(self
            .read()
            .issues
            .values()
            .filter(|i| i.logical_id.as_deref() == Some(logical_id))
            .min_by_key(|i| i.sequence)
            .cloned())
    }

    async fn put_issue(&mut self, issue: Issue) -> Result<()> {
        issue.validate().map_err(Error::validation)?;
        self.write().upsert_issue(issue);
        Ok(())
    }

    async fn remove_issue(&mut self, id: &IssueId) -> Result<Issue> {
        let inner = self.write();
        let node = inner.node(id)?;

        // removes every incident edge as well
        inner.graph.remove_node(node);
        inner.node_map.remove(id);
        inner.events.retain(|e| &e.issue_id != id);
        inner.id_generator.release(id.as_str());
        inner
            .issues
            .remove(id)
            .ok_or_else(|| Error::IssueNotFound(id.clone()))
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.read().issues_in_order())
    }

    async fn insert_edge(&mut self, edge: DependencyEdge) -> Result<()> {
        let inner = self.write();
        let from = inner.node(&edge.issue_id)?;
        let to = inner.node(&edge.depends_on_id)?;

        let seq = inner.next_edge_seq;
        inner.next_edge_seq += 1;
        inner.graph.add_edge(from, to, StoredEdge { seq, edge });
        Ok(())
    }

    async fn find_edge(
        &self,
        from: &IssueId,
        to: &IssueId,
        dep_type: DependencyType,
    ) -> Result<Option<DependencyEdge>> {
        let inner = self.read();
        Ok(inner
            .find_edge_index(from, to, dep_type)
            .and_then(|idx| inner.graph.edge_weight(idx))
            .map(|stored| stored.edge.clone()))
    }

    async fn edges_from(
        &self,
        id: &IssueId,
        types: &[DependencyType],
    ) -> Result<Vec<DependencyEdge>> {
        Ok(self.read().edges_directed(id, Direction::Outgoing, types))
    }

    async fn edges_to(&self, id: &IssueId, types: &[DependencyType]) -> Result<Vec<DependencyEdge>> {
        Ok(self.read().edges_directed(id, Direction::Incoming, types))
    }

    async fn set_child_order(
        &mut self,
        child: &IssueId,
        parent: &IssueId,
        order: u32,
    ) -> Result<bool> {
        let Some(idx) = self
            .read()
            .find_edge_index(child, parent, DependencyType::ParentChild)
        else {
            return Ok(false);
        };

        let inner = self.write();
        match inner.graph.edge_weight_mut(idx) {
            Some(stored) => {
                stored.edge.child_order = order;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_edge(
        &mut self,
        from: &IssueId,
        to: &IssueId,
        dep_type: DependencyType,
    ) -> Result<Option<DependencyEdge>> {
        let Some(idx) = self.read().find_edge_index(from, to, dep_type) else {
            return Ok(None);
        };
        Ok(self.write().graph.remove_edge(idx).map(|stored| stored.edge))
    }

    async fn list_edges(&self) -> Result<Vec<DependencyEdge>> {
        Ok(self.read().all_edges())
    }

    async fn record_event(&mut self, event: NewEvent) -> Result<Event> {
        let inner = self.write();
        let event = Event {
            id: inner.next_event_id,
            issue_id: event.issue_id,
            kind: event.kind,
            actor: event.actor,
            old_value: event.old_value,
            new_value: event.new_value,
            comment: event.comment,
            created_at: Utc::now(),
        };
        inner.next_event_id += 1;
        inner.events.push(event.clone());
        Ok(event)
    }

    async fn restore_event(&mut self, mut event: Event) -> Result<()> {
        let inner = self.write();
        event.id = inner.next_event_id;
        inner.next_event_id += 1;
        inner.events.push(event);
        Ok(())
    }

    async fn events_for(&self, id: &IssueId) -> Result<Vec<Event>> {
        Ok(self
            .read()
            .events
            .iter()
            .filter(|e| &e.issue_id == id)
            .cloned()
            .collect())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let InMemorySession { mut guard, staged } = *self;
        if let Some(staged) = staged {
            *guard = staged;
        }
        Ok(())
    }
}
