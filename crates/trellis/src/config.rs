//! Workspace configuration.
//!
//! A trellis workspace is a directory containing `.trellis/config.yaml`.
//! Every key except `issue-prefix` may be omitted.

use crate::engine::{DEFAULT_ACTOR, DEFAULT_TREE_DEPTH};
use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default issue prefix if none specified
pub const DEFAULT_PREFIX: &str = "proj";

/// Name of the workspace directory
pub const TRELLIS_DIR_NAME: &str = ".trellis";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the issues data file
pub const ISSUES_FILE_NAME: &str = "issues.jsonl";

/// Default number of items `ready` prints
pub const DEFAULT_READY_LIMIT: usize = 10;

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Contents of `.trellis/config.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TrellisConfig {
    /// Issue ID prefix (e.g., "proj" for "proj-a3f8")
    pub issue_prefix: String,

    /// Actor written into provenance and audit events
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Storage section
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ready-set section
    #[serde(default)]
    pub ready: ReadyConfig,

    /// Tree section
    #[serde(default)]
    pub tree: TreeConfig,
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Nothing survives the process
    Memory,

    /// Snapshot in a JSONL file
    #[default]
    Jsonl,
}

/// `storage:` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Backend kind
    pub backend: BackendKind,

    /// Data file, relative to the workspace root
    pub data_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Jsonl,
            data_file: Path::new(TRELLIS_DIR_NAME).join(ISSUES_FILE_NAME),
        }
    }
}

/// `ready:` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ReadyConfig {
    /// Items listed when `-n` is not given
    pub default_limit: usize,
}

impl Default for ReadyConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_READY_LIMIT,
        }
    }
}

/// `tree:` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TreeConfig {
    /// Depth `dep tree` expands when `--depth` is not given
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_TREE_DEPTH,
        }
    }
}

fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

impl TrellisConfig {
    /// Create a new configuration with the given prefix
    pub fn new(prefix: &str) -> Self {
        Self {
            issue_prefix: prefix.to_string(),
            actor: default_actor(),
            storage: StorageConfig::default(),
            ready: ReadyConfig::default(),
            tree: TreeConfig::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file can't be read and `Error::Config` if
    /// it isn't valid YAML for this structure.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Backend for a workspace rooted at `root`
    pub fn storage_backend(&self, root: &Path) -> StorageBackend {
        match self.storage.backend {
            BackendKind::Memory => StorageBackend::InMemory,
            BackendKind::Jsonl => StorageBackend::Jsonl(root.join(&self.storage.data_file)),
        }
    }
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Path of the config file for a workspace rooted at `root`
pub fn config_path(root: &Path) -> PathBuf {
    root.join(TRELLIS_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Check if a directory has been initialized.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(TRELLIS_DIR_NAME).exists()
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the first directory containing `.trellis/`, or `None` once the
/// filesystem root or [`MAX_TRAVERSAL_DEPTH`] is reached.
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if is_initialized(&current) {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_new() {
        let config = TrellisConfig::new("myproj");
        assert_eq!(config.issue_prefix, "myproj");
        assert_eq!(config.actor, DEFAULT_ACTOR);
        assert_eq!(config.storage.backend, BackendKind::Jsonl);
        assert_eq!(config.ready.default_limit, 10);
        assert_eq!(config.tree.max_depth, 10);
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut original = TrellisConfig::new("test123");
        original.actor = "ana".to_string();
        original.ready.default_limit = 3;
        original.save(&config_path).await.unwrap();

        let loaded = TrellisConfig::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_yaml_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        TrellisConfig::new("myproj").save(&config_path).await.unwrap();
        let content = tokio::fs::read_to_string(&config_path).await.unwrap();

        assert!(content.contains("issue-prefix: myproj"));
        assert!(content.contains("backend: jsonl"));
        assert!(content.contains("data-file: .trellis/issues.jsonl"));
        assert!(content.contains("default-limit: 10"));
    }

    #[tokio::test]
    async fn test_minimal_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        tokio::fs::write(&config_path, "issue-prefix: tr\nstorage:\n  backend: memory\n  data-file: x.jsonl\n")
            .await
            .unwrap();

        let config = TrellisConfig::load(&config_path).await.unwrap();
        assert_eq!(config.issue_prefix, "tr");
        assert_eq!(config.actor, DEFAULT_ACTOR);
        assert_eq!(
            config.storage_backend(temp_dir.path()),
            StorageBackend::InMemory
        );
        assert_eq!(config.tree.max_depth, DEFAULT_TREE_DEPTH);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        tokio::fs::write(&config_path, "storage: [").await.unwrap();

        let err = TrellisConfig::load(&config_path).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_jsonl_backend_resolves_against_root() {
        let root = Path::new("/work");
        let backend = TrellisConfig::new("p").storage_backend(root);
        assert_eq!(
            backend,
            StorageBackend::Jsonl(PathBuf::from("/work/.trellis/issues.jsonl"))
        );
    }

    #[test]
    fn test_find_root_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(TRELLIS_DIR_NAME)).unwrap();
        let sub_dir = temp_dir.path().join("sub").join("nested");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(find_root(&sub_dir), Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn test_find_root_not_found() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_root(temp_dir.path()).is_none());
    }
}
