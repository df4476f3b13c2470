//! In-memory storage backend using HashMap and petgraph.
//!
//! All data lives in RAM and is **lost when the process exits** unless the
//! store is wrapped by [`crate::storage::jsonl::JsonlStore`].
//!
//! # Architecture
//!
//! - `HashMap<IssueId, Issue>` for O(1) issue lookups
//! - `petgraph::StableDiGraph` for the typed edges
//! - `HashMap<IssueId, NodeIndex>` mapping issues to graph nodes
//! - an append-only event log
//!
//! # Sessions
//!
//! [`InMemoryStore::begin`](crate::storage::GraphStore::begin) takes an owned
//! `tokio::sync::Mutex` guard, so sessions run one at a time. The first write
//! in a session clones the state; commit replaces the shared state with the
//! clone. A read-only session never copies anything.

mod inner;
mod session;

use crate::error::Result;
use crate::storage::{GraphSession, GraphStore};
use async_trait::async_trait;
use inner::Inner;
use session::InMemorySession;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe in-memory store.
///
/// Cloning is cheap and clones share the same state.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    /// Create an empty store whose ids start with `prefix`.
    ///
    /// ```
    /// use trellis::storage::in_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::new("proj");
    /// # let _ = store;
    /// ```
    pub fn new(prefix: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new(prefix))),
        }
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn GraphSession>> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        Ok(Box::new(InMemorySession::new(guard)))
    }
}
