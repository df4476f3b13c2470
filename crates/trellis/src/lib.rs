//! Trellis - dependency-aware work item tracking.
//!
//! Work items live in a typed graph: `blocks` and `related` edges between
//! peers, and `parent-child` edges forming a hierarchy. The [`Engine`]
//! rejects edges that would close a cycle or break the hierarchy rules, and
//! answers which items are ready to start.
//!
//! The crate provides both the `trellis` CLI and a library:
//!
//! ```
//! use trellis::domain::{DependencyType, NewIssue};
//! use trellis::storage::{StorageBackend, create_store};
//! use trellis::Engine;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> trellis::Result<()> {
//! let engine = Engine::new(create_store(StorageBackend::InMemory, "demo").await?);
//! let schema = engine.create_issue(NewIssue::new("Design schema")).await?;
//! let api = engine.create_issue(NewIssue::new("Build API")).await?;
//! engine.add_dependency(&api.id, &schema.id, DependencyType::Blocks).await?;
//!
//! let ready = engine.ready(10).await?;
//! assert_eq!(ready.len(), 1);
//! assert_eq!(ready[0].id, schema.id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod id_generation;
pub mod import;
pub mod output;
pub mod storage;

pub use engine::Engine;
pub use error::{Error, ErrorKind, Result};
