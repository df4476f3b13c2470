//! Issue lifecycle: create, update, delete, status transitions, comments.
//!
//! Every change records an audit [`Event`] in the same session, so either
//! both land or neither does.

use super::{Engine, require_issue};
use crate::domain::{
    DependencyType, Event, EventKind, Issue, IssueFilter, IssueId, IssueUpdate, NewEvent,
    NewIssue, Transition, validate_priority, validate_title,
};
use crate::error::{Error, Result};
use chrono::Utc;
use tracing::debug;

impl Engine {
    /// Create an issue and record its `created` event.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationFailed` for a blank/too long title or an
    /// out-of-range priority.
    pub async fn create_issue(&self, new_issue: NewIssue) -> Result<Issue> {
        let mut session = self.begin().await?;
        let issue = session.create_issue(new_issue, self.actor()).await?;
        session
            .record_event(
                NewEvent::new(issue.id.clone(), EventKind::Created, self.actor())
                    .values(None, Some(issue.title.clone())),
            )
            .await?;
        session.commit()?;

        debug!(issue_id = %issue.id, "created issue");
        Ok(issue)
    }

    /// Fetch one issue.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if it doesn't exist.
    pub async fn get_issue(&self, id: &IssueId) -> Result<Issue> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), id).await
    }

    /// Issues passing `filter`, in creation order, after skipping its offset
    /// and truncating to its limit.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the graph cannot be read.
    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let session = self.begin().await?;
        let mut issues: Vec<Issue> = session
            .list_issues()
            .await?
            .into_iter()
            .filter(|issue| filter.matches(issue))
            .skip(filter.offset)
            .collect();
        if let Some(limit) = filter.limit {
            issues.truncate(limit);
        }
        Ok(issues)
    }

    /// Apply a content update. Status is not touched; use the transition
    /// methods for that.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if the issue doesn't exist
    /// - `Error::ValidationFailed` for an invalid title or priority
    pub async fn update_issue(&self, id: &IssueId, update: IssueUpdate) -> Result<Issue> {
        let mut errors = Vec::new();
        if let Some(title) = &update.title {
            errors.extend(validate_title(title).err());
        }
        if let Some(priority) = update.priority {
            errors.extend(validate_priority(priority).err());
        }
        if !errors.is_empty() {
            return Err(Error::ValidationFailed { errors });
        }

        let mut session = self.begin().await?;
        let mut issue = require_issue(session.as_ref(), id).await?;

        if update.apply_to(&mut issue) {
            issue.updated_at = Utc::now();
            session.put_issue(issue.clone()).await?;
            session
                .record_event(NewEvent::new(id.clone(), EventKind::Updated, self.actor()))
                .await?;
            session.commit()?;
            debug!(issue_id = %id, "updated issue");
        }
        Ok(issue)
    }

    /// Delete an issue that nothing points at.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if the issue doesn't exist
    /// - `Error::HasChildren` if it still contains other issues
    /// - `Error::HasDependents` if other issues depend on it
    pub async fn delete_issue(&self, id: &IssueId) -> Result<Issue> {
        let mut session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;

        let children = session
            .edges_to(id, &[DependencyType::ParentChild])
            .await?;
        if !children.is_empty() {
            return Err(Error::HasChildren {
                issue_id: id.clone(),
                count: children.len(),
            });
        }

        let dependents = session
            .edges_to(id, &[DependencyType::Blocks, DependencyType::Related])
            .await?;
        if !dependents.is_empty() {
            let mut ids: Vec<IssueId> = dependents.into_iter().map(|e| e.issue_id).collect();
            ids.sort();
            ids.dedup();
            return Err(Error::HasDependents {
                issue_id: id.clone(),
                dependents: ids,
            });
        }

        let removed = session.remove_issue(id).await?;
        session.commit()?;
        debug!(issue_id = %id, "deleted issue");
        Ok(removed)
    }

    /// Apply a status transition, recording its event.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if the issue doesn't exist
    /// - `Error::PreconditionFailed` if the transition is not allowed from
    ///   the current status
    pub async fn transition(
        &self,
        id: &IssueId,
        transition: Transition,
        comment: Option<String>,
    ) -> Result<Issue> {
        let mut session = self.begin().await?;
        let mut issue = require_issue(session.as_ref(), id).await?;

        let old = issue.status;
        let new = old
            .apply(transition)
            .ok_or_else(|| Error::PreconditionFailed {
                issue_id: id.clone(),
                status: old,
                transition,
            })?;

        let now = Utc::now();
        issue.status = new;
        issue.updated_at = now;
        let kind = match transition {
            Transition::Close => {
                issue.closed_at = Some(now);
                EventKind::Closed
            }
            Transition::Reopen => {
                issue.closed_at = None;
                EventKind::Reopened
            }
            Transition::Start | Transition::Block | Transition::Unblock => {
                EventKind::StatusChanged
            }
        };

        session.put_issue(issue.clone()).await?;
        session
            .record_event(
                NewEvent::new(id.clone(), kind, self.actor())
                    .values(Some(old.to_string()), Some(new.to_string()))
                    .comment(comment),
            )
            .await?;
        session.commit()?;

        debug!(issue_id = %id, from = %old, to = %new, "status changed");
        Ok(issue)
    }

    /// `open | blocked -> in_progress`
    ///
    /// # Errors
    ///
    /// See [`Engine::transition`].
    pub async fn start(&self, id: &IssueId, comment: Option<String>) -> Result<Issue> {
        self.transition(id, Transition::Start, comment).await
    }

    /// `open | in_progress -> blocked`
    ///
    /// # Errors
    ///
    /// See [`Engine::transition`].
    pub async fn block(&self, id: &IssueId, comment: Option<String>) -> Result<Issue> {
        self.transition(id, Transition::Block, comment).await
    }

    /// `blocked -> open`
    ///
    /// # Errors
    ///
    /// See [`Engine::transition`].
    pub async fn unblock(&self, id: &IssueId, comment: Option<String>) -> Result<Issue> {
        self.transition(id, Transition::Unblock, comment).await
    }

    /// `open | in_progress -> closed`, setting `closed_at`
    ///
    /// # Errors
    ///
    /// See [`Engine::transition`].
    pub async fn close(&self, id: &IssueId, comment: Option<String>) -> Result<Issue> {
        self.transition(id, Transition::Close, comment).await
    }

    /// `closed -> open`, clearing `closed_at`
    ///
    /// # Errors
    ///
    /// See [`Engine::transition`].
    pub async fn reopen(&self, id: &IssueId, comment: Option<String>) -> Result<Issue> {
        self.transition(id, Transition::Reopen, comment).await
    }

    /// Attach a comment to an issue.
    ///
    /// # Errors
    ///
    /// - `Error::IssueNotFound` if the issue doesn't exist
    /// - `Error::ValidationFailed` for an empty comment
    pub async fn add_comment(&self, id: &IssueId, text: &str) -> Result<Event> {
        if text.trim().is_empty() {
            return Err(Error::validation("Comment cannot be empty"));
        }
        let mut session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;
        let event = session
            .record_event(
                NewEvent::new(id.clone(), EventKind::Commented, self.actor())
                    .comment(Some(text.to_string())),
            )
            .await?;
        session.commit()?;
        Ok(event)
    }

    /// Audit trail of an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if the issue doesn't exist.
    pub async fn events(&self, id: &IssueId) -> Result<Vec<Event>> {
        let session = self.begin().await?;
        require_issue(session.as_ref(), id).await?;
        session.events_for(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueStatus, IssueType};
    use crate::error::ErrorKind;
    use crate::storage::in_memory::InMemoryStore;
    use rstest::rstest;
    use std::sync::Arc;

    fn engine() -> Engine {
        Engine::new(Arc::new(InMemoryStore::new("l"))).with_actor("ana")
    }

    #[tokio::test]
    async fn test_create_records_event() {
        let engine = engine();
        let issue = engine.create_issue(NewIssue::new("Hello")).await.unwrap();

        assert_eq!(issue.status, IssueStatus::Open);
        let events = engine.events(&issue.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[0].actor, "ana");
    }

    #[tokio::test]
    async fn test_invalid_new_issue_rejected() {
        let engine = engine();
        let err = engine.create_issue(NewIssue::new("  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(engine
            .list_issues(&IssueFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_search_and_paging() {
        let engine = engine();
        for title in ["Login page", "Logout button", "Billing export", "Login audit"] {
            engine.create_issue(NewIssue::new(title)).await.unwrap();
        }

        let titles = |issues: Vec<Issue>| -> Vec<String> {
            issues.into_iter().map(|i| i.title).collect()
        };

        let logins = engine
            .list_issues(&IssueFilter {
                search: Some("login".to_string()),
                ..IssueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(logins), vec!["Login page", "Login audit"]);

        let page = engine
            .list_issues(&IssueFilter {
                offset: 1,
                limit: Some(2),
                ..IssueFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(page), vec!["Logout button", "Billing export"]);

        let past_end = engine
            .list_issues(&IssueFilter {
                offset: 10,
                ..IssueFilter::default()
            })
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_close_and_reopen_manage_closed_at() {
        let engine = engine();
        let issue = engine.create_issue(NewIssue::new("Work")).await.unwrap();

        let closed = engine
            .close(&issue.id, Some("done".to_string()))
            .await
            .unwrap();
        assert_eq!(closed.status, IssueStatus::Closed);
        assert!(closed.closed_at.is_some());

        let reopened = engine.reopen(&issue.id, None).await.unwrap();
        assert_eq!(reopened.status, IssueStatus::Open);
        assert!(reopened.closed_at.is_none());

        let kinds: Vec<EventKind> = engine
            .events(&issue.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::Created, EventKind::Closed, EventKind::Reopened]
        );
    }

    #[rstest]
    #[case(Transition::Start)]
    #[case(Transition::Block)]
    #[case(Transition::Close)]
    #[tokio::test]
    async fn test_closed_issue_only_reopens(#[case] transition: Transition) {
        let engine = engine();
        let issue = engine.create_issue(NewIssue::new("Work")).await.unwrap();
        engine.close(&issue.id, None).await.unwrap();

        let err = engine
            .transition(&issue.id, transition, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(
            engine.get_issue(&issue.id).await.unwrap().status,
            IssueStatus::Closed
        );
    }

    #[tokio::test]
    async fn test_update_ignores_status_and_records_change() {
        let engine = engine();
        let issue = engine.create_issue(NewIssue::new("Old")).await.unwrap();

        let updated = engine
            .update_issue(
                &issue.id,
                IssueUpdate {
                    title: Some("New".to_string()),
                    issue_type: Some(IssueType::Bug),
                    ..IssueUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.issue_type, IssueType::Bug);
        assert_eq!(updated.id, issue.id);
        assert_eq!(engine.events(&issue.id).await.unwrap().len(), 2);

        let err = engine
            .update_issue(
                &issue.id,
                IssueUpdate {
                    priority: Some(9),
                    ..IssueUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_delete_refuses_parents_and_dependencies() {
        let engine = engine();
        let epic = engine
            .create_issue(NewIssue::new("Epic").with_type(IssueType::Epic))
            .await
            .unwrap();
        let task = engine.create_issue(NewIssue::new("Task")).await.unwrap();
        let other = engine.create_issue(NewIssue::new("Other")).await.unwrap();
        engine
            .add_dependency(&task.id, &epic.id, DependencyType::ParentChild)
            .await
            .unwrap();
        engine
            .add_dependency(&other.id, &task.id, DependencyType::Blocks)
            .await
            .unwrap();

        let err = engine.delete_issue(&epic.id).await.unwrap_err();
        assert!(matches!(err, Error::HasChildren { count: 1, .. }));

        let err = engine.delete_issue(&task.id).await.unwrap_err();
        assert!(matches!(err, Error::HasDependents { .. }));

        // `other` only has outgoing edges, which go with it
        engine.delete_issue(&other.id).await.unwrap();
        assert!(engine.get_dependents(&task.id).await.unwrap().is_empty());
        assert_eq!(
            engine.get_issue(&other.id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_comment_is_recorded() {
        let engine = engine();
        let issue = engine.create_issue(NewIssue::new("Work")).await.unwrap();

        let event = engine.add_comment(&issue.id, "looks good").await.unwrap();
        assert_eq!(event.kind, EventKind::Commented);
        assert_eq!(event.comment.as_deref(), Some("looks good"));
        assert!(engine.add_comment(&issue.id, " ").await.is_err());
    }
}
