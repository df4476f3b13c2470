//! Application context for CLI command execution.
//!
//! # Example
//!
//! ```no_run
//! use trellis::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let ready = app.engine().ready(app.config().ready.default_limit).await?;
//!     println!("{} ready", ready.len());
//!     Ok(())
//! }
//! ```

use crate::config::{TRELLIS_DIR_NAME, TrellisConfig, config_path, find_root};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::storage::create_store;
use std::path::{Path, PathBuf};

/// Loaded workspace: configuration plus an engine over its store
#[derive(Debug)]
pub struct App {
    engine: Engine,
    config: TrellisConfig,
    root: PathBuf,
}

impl App {
    /// Open the workspace containing `working_dir`.
    ///
    /// Searches up the directory tree for `.trellis/`, loads the config and
    /// opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no workspace is found in the directory tree
    /// - the configuration cannot be loaded
    /// - the data file exists but cannot be read
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root = find_root(working_dir).ok_or_else(|| {
            Error::Config(format!(
                "Not a trellis workspace (no '{TRELLIS_DIR_NAME}' found). Run 'trellis init' first"
            ))
        })?;

        let config = TrellisConfig::load(&config_path(&root)).await?;
        let store = create_store(config.storage_backend(&root), &config.issue_prefix).await?;
        let engine = Engine::new(store).with_actor(config.actor.clone());

        Ok(Self {
            engine,
            config,
            root,
        })
    }

    /// The engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Loaded configuration
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Directory containing `.trellis/`
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the store. Call after every mutating command.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if writing fails.
    pub async fn save(&self) -> Result<()> {
        self.engine.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use crate::domain::NewIssue;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("proj")).await.unwrap();
        let sub_dir = temp_dir.path().join("src").join("lib");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let app = App::from_directory(&sub_dir).await.unwrap();
        assert_eq!(app.config().issue_prefix, "proj");
        assert_eq!(app.root(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Not a trellis workspace"));
    }

    #[tokio::test]
    async fn test_saved_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        init::init(temp_dir.path(), Some("keep")).await.unwrap();

        let app = App::from_directory(temp_dir.path()).await.unwrap();
        let issue = app
            .engine()
            .create_issue(NewIssue::new("Persisted"))
            .await
            .unwrap();
        app.save().await.unwrap();
        drop(app);

        let reopened = App::from_directory(temp_dir.path()).await.unwrap();
        let loaded = reopened.engine().get_issue(&issue.id).await.unwrap();
        assert_eq!(loaded.title, "Persisted");
        assert_eq!(loaded.created_by, "local");
    }
}
