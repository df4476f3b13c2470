//! Implementation of the `init` command.
//!
//! Creates the `.trellis/` directory with a config file, an empty data file
//! and a `.gitignore`.

use crate::config::{
    CONFIG_FILE_NAME, DEFAULT_PREFIX, ISSUES_FILE_NAME, TRELLIS_DIR_NAME, TrellisConfig,
    is_initialized,
};
use crate::error::{Error, Result};
use crate::id_generation::validate_prefix;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within `.trellis`
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Result of the init command
#[derive(Debug, Serialize)]
pub struct InitResult {
    /// Path to the created `.trellis` directory
    pub trellis_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created issues file
    pub issues_file: PathBuf,
    /// The prefix used for issue IDs
    pub prefix: String,
}

/// Initialize a workspace in `base_dir`.
///
/// # Errors
///
/// Returns an error if:
/// - `.trellis/` already exists
/// - the prefix is invalid
/// - file system operations fail
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix).map_err(|e| Error::Config(e.to_string()))?;

    if is_initialized(base_dir) {
        return Err(Error::Config(format!(
            "Trellis is already initialized in this directory. Found existing '{TRELLIS_DIR_NAME}'"
        )));
    }

    let trellis_dir = base_dir.join(TRELLIS_DIR_NAME);
    fs::create_dir_all(&trellis_dir).await?;

    let config_file = trellis_dir.join(CONFIG_FILE_NAME);
    TrellisConfig::new(prefix).save(&config_file).await?;

    let issues_file = trellis_dir.join(ISSUES_FILE_NAME);
    fs::write(&issues_file, "").await?;

    fs::write(
        trellis_dir.join(GITIGNORE_FILE_NAME),
        "# issues.jsonl is meant to be committed\n*.tmp\n",
    )
    .await?;

    Ok(InitResult {
        trellis_dir,
        config_file,
        issues_file,
        prefix: prefix.to_string(),
    })
}
