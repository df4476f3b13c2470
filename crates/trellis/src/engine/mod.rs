//! Dependency and hierarchy resolution engine.
//!
//! [`Engine`] is the single entry point for graph operations. It holds a
//! shared [`GraphStore`] and the actor name written into provenance fields
//! and audit events. Every public method opens one session, does its work
//! and commits; errors leave the store unchanged.
//!
//! The operations are grouped by concern:
//!
//! - [`cycle`]: same-type reachability check run before every edge insert
//! - [`hierarchy`]: parent/child type table, eligible parents/children,
//!   sibling ordering
//! - [`dependency`]: adding, removing and listing edges, dependency trees
//! - [`ready`]: the ready set and what keeps items out of it
//! - [`blocking`]: shortest path to the nearest open blocker
//! - [`lifecycle`]: creating, updating and deleting issues, status
//!   transitions, comments
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::domain::{DependencyType, NewIssue};
//! use trellis::engine::Engine;
//! use trellis::storage::in_memory::InMemoryStore;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> trellis::Result<()> {
//!     let engine = Engine::new(Arc::new(InMemoryStore::new("demo"))).with_actor("alice");
//!
//!     let schema = engine.create_issue(NewIssue::new("Design schema")).await?;
//!     let api = engine.create_issue(NewIssue::new("Build API")).await?;
//!     engine
//!         .add_dependency(&api.id, &schema.id, DependencyType::Blocks)
//!         .await?;
//!
//!     let ready = engine.ready(10).await?;
//!     assert_eq!(ready.len(), 1);
//!     assert_eq!(ready[0].id, schema.id);
//!     Ok(())
//! }
//! ```

pub mod blocking;
pub mod cycle;
pub mod dependency;
pub mod hierarchy;
pub mod lifecycle;
pub mod ready;

pub use blocking::MAX_BLOCKING_DEPTH;
pub use dependency::DEFAULT_TREE_DEPTH;
pub use hierarchy::{allowed_children, is_valid_parent_child, is_valid_parent_child_str};

use crate::domain::{Issue, IssueId};
use crate::error::{Error, Result};
use crate::storage::{GraphSession, GraphStore};
use std::sync::Arc;

/// Actor used when none is configured
pub const DEFAULT_ACTOR: &str = "local";

/// Facade over a [`GraphStore`]
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn GraphStore>,
    actor: String,
}

impl Engine {
    /// Engine acting as [`DEFAULT_ACTOR`]
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    /// Use `actor` for provenance and audit events
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Current actor
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Persist committed state (no-op for the in-memory backend).
    ///
    /// # Errors
    ///
    /// Returns the backend's error if writing fails.
    pub async fn save(&self) -> Result<()> {
        self.store.save().await
    }

    pub(crate) async fn begin(&self) -> Result<Box<dyn GraphSession>> {
        self.store.begin().await
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

/// Fetch an issue or fail with [`Error::IssueNotFound`]
pub(crate) async fn require_issue(session: &dyn GraphSession, id: &IssueId) -> Result<Issue> {
    session
        .get_issue(id)
        .await?
        .ok_or_else(|| Error::IssueNotFound(id.clone()))
}
