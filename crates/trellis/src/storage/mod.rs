//! Storage abstraction layer for trellis.
//!
//! The engine never talks to a concrete backend. It asks a [`GraphStore`] for
//! a [`GraphSession`], performs its reads and writes through that session and
//! then commits. A session that is dropped without [`GraphSession::commit`]
//! discards every write it made, so an early `?` return leaves the store
//! untouched.
//!
//! Two backends ship with the crate:
//!
//! - **In-memory** ([`in_memory::InMemoryStore`]): `HashMap` plus a petgraph
//!   `StableDiGraph`, ephemeral.
//! - **JSONL** ([`jsonl::JsonlStore`]): the in-memory store, loaded from and
//!   saved to a JSON Lines file.
//!
//! # Edge direction
//!
//! Edges point from the dependent issue to the issue it depends on. For
//! `parent-child` edges the child is the source and the parent the target.
//!
//! # Example
//!
//! ```
//! use trellis::storage::{create_store, StorageBackend};
//! use trellis::domain::NewIssue;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = create_store(StorageBackend::InMemory, "demo").await?;
//!
//!     let mut session = store.begin().await?;
//!     let issue = session.create_issue(NewIssue::new("Write docs"), "alice").await?;
//!     session.commit()?;
//!
//!     println!("Created issue: {}", issue.id);
//!     Ok(())
//! }
//! ```

use crate::domain::{
    DependencyEdge, DependencyType, Event, Issue, IssueId, NewEvent, NewIssue,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod in_memory;
pub mod jsonl;

/// A transactional graph store.
///
/// Implementations must be `Send + Sync`; the engine shares one store across
/// tasks behind an `Arc`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Open a session. Sessions are serialised: a second `begin` waits until
    /// the first session is committed or dropped.
    async fn begin(&self) -> Result<Box<dyn GraphSession>>;

    /// Flush committed state to durable storage.
    ///
    /// Backends without a durable layer keep the default no-op.
    async fn save(&self) -> Result<()> {
        Ok(())
    }
}

/// One unit of work against a [`GraphStore`].
///
/// Reads observe the session's own uncommitted writes. Edge-level methods do
/// not check graph invariants; that is the job of the engine's cycle guard
/// and hierarchy validator.
#[async_trait]
pub trait GraphSession: Send + Sync {
    // ========== Issues ==========

    /// Create an issue, assigning its id, sequence and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationFailed` if the title or priority is invalid.
    async fn create_issue(&mut self, new_issue: NewIssue, actor: &str) -> Result<Issue>;

    /// Get an issue by id. Returns `None` if it doesn't exist.
    async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Find the issue carrying the given logical (document) id.
    async fn find_by_logical_id(&self, logical_id: &str) -> Result<Option<Issue>>;

    /// Insert or replace an issue as given, keeping its id and sequence.
    async fn put_issue(&mut self, issue: Issue) -> Result<()>;

    /// Remove an issue together with its outgoing edges and events.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` if the issue doesn't exist.
    async fn remove_issue(&mut self, id: &IssueId) -> Result<Issue>;

    /// All issues in creation order.
    async fn list_issues(&self) -> Result<Vec<Issue>>;

    // ========== Edges ==========

    /// Store an edge. Both endpoints must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::IssueNotFound` for a missing endpoint.
    async fn insert_edge(&mut self, edge: DependencyEdge) -> Result<()>;

    /// The `(from, to, dep_type)` edge, if stored.
    async fn find_edge(
        &self,
        from: &IssueId,
        to: &IssueId,
        dep_type: DependencyType,
    ) -> Result<Option<DependencyEdge>>;

    /// Outgoing edges of `id` whose type is in `types`, in insertion order.
    async fn edges_from(&self, id: &IssueId, types: &[DependencyType])
        -> Result<Vec<DependencyEdge>>;

    /// Incoming edges of `id` whose type is in `types`, in insertion order.
    async fn edges_to(&self, id: &IssueId, types: &[DependencyType]) -> Result<Vec<DependencyEdge>>;

    /// Set `child_order` on the `child -> parent` parent-child edge.
    /// Returns `false` when no such edge exists.
    async fn set_child_order(&mut self, child: &IssueId, parent: &IssueId, order: u32)
        -> Result<bool>;

    /// Remove the `(from, to, dep_type)` edge, returning it if it existed.
    async fn remove_edge(
        &mut self,
        from: &IssueId,
        to: &IssueId,
        dep_type: DependencyType,
    ) -> Result<Option<DependencyEdge>>;

    /// Every edge in insertion order.
    async fn list_edges(&self) -> Result<Vec<DependencyEdge>>;

    // ========== Audit ==========

    /// Append an audit event.
    async fn record_event(&mut self, event: NewEvent) -> Result<Event>;

    /// Re-insert a previously recorded event, keeping its timestamp. The
    /// store assigns a fresh id.
    async fn restore_event(&mut self, event: Event) -> Result<()>;

    /// Events of one issue, oldest first.
    async fn events_for(&self, id: &IssueId) -> Result<Vec<Event>>;

    // ========== Transaction ==========

    /// Make the session's writes visible to later sessions.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// Returns the data file path for file-based backends.
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// Create a store for the given backend.
///
/// A JSONL file that does not exist yet yields an empty store; the file is
/// written on the first [`GraphStore::save`]. Load warnings are logged and
/// do not fail the call.
///
/// # Errors
///
/// Returns an error if the data file exists but cannot be read.
pub async fn create_store(backend: StorageBackend, prefix: &str) -> Result<Arc<dyn GraphStore>> {
    match backend {
        StorageBackend::InMemory => Ok(Arc::new(in_memory::InMemoryStore::new(prefix))),
        StorageBackend::Jsonl(path) => {
            let (store, warnings) = jsonl::JsonlStore::open(path, prefix).await?;
            for warning in &warnings {
                tracing::warn!(warning = %warning, "JSONL load warning");
            }
            Ok(Arc::new(store))
        }
    }
}
