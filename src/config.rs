//! # Configuration Management Module
//!
//! Run configuration for one compression pass over a source tree.
//!
//! ## Parameters:
//! - `root_dir`: directory holding the JS sources (default: `src/main/resources`)
//! - `recursive`: descend into sub-directories (default: true)
//! - `source_encoding`: charset handed to the compiler (default: "UTF-8")
//! - `target_suffix`: suffix of the minified sibling file (default: ".min.js")
//! - `force`: recompress even when the output is up to date (default: false)
//! - `externs`: extern declaration files passed through to the compiler
//! - `source_extension`: extension of candidate sources (default: ".js")
//! - `compressed_suffixes`: names that mark a file as already minified
//! - `workers`: concurrent compressions (default: 1)
//! - `timeout_secs`: per-file time budget (default: none)
//!
//! The configuration is immutable once a run starts; the orchestrator only
//! reads it.
//!
//! ## Example:
//! ```rust
//! use js_compress::RunConfig;
//!
//! let config = RunConfig {
//!     root_dir: "web/js".into(),
//!     force: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! # Ok::<(), js_compress::CompressError>(())
//! ```

use crate::error::CompressError;
use crate::path_util::{PathUtil, DEFAULT_COMPRESSED_SUFFIXES};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration of a compression run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory where the JS files reside
    pub root_dir: PathBuf,
    /// Recurse into sub-directories
    pub recursive: bool,
    /// Encoding of the source files
    pub source_encoding: String,
    /// Suffix appended to the extension-less source path
    pub target_suffix: String,
    /// Compress even if the output is newer than the source
    pub force: bool,
    /// Extern files handed to the compiler unchanged
    pub externs: Vec<PathBuf>,
    /// Extension a file must have to be a candidate
    pub source_extension: String,
    /// File name suffixes of already compressed files
    pub compressed_suffixes: Vec<String>,
    /// Number of concurrent compressions
    pub workers: usize,
    /// Per-file timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Emit newline-delimited JSON events on stdout
    pub json_output: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("src/main/resources"),
            recursive: true,
            source_encoding: "UTF-8".to_string(),
            target_suffix: ".min.js".to_string(),
            force: false,
            externs: Vec::new(),
            source_extension: ".js".to_string(),
            compressed_suffixes: DEFAULT_COMPRESSED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            workers: 1,
            timeout_secs: None,
            json_output: false,
            show_progress: true,
        }
    }
}

impl RunConfig {
    /// Validate configuration parameters.
    ///
    /// The root directory itself is checked by the orchestrator when the run
    /// starts.
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.source_extension.len() < 2 || !self.source_extension.starts_with('.') {
            return Err(CompressError::Config(format!(
                "Source extension must look like '.js', got '{}'",
                self.source_extension
            )));
        }

        if self.target_suffix.is_empty() {
            return Err(CompressError::Config("Target suffix must not be empty".to_string()));
        }

        if self.target_suffix == self.source_extension {
            return Err(CompressError::Config(format!(
                "Target suffix '{}' would overwrite the sources",
                self.target_suffix
            )));
        }

        if self.source_encoding.trim().is_empty() {
            return Err(CompressError::Config("Source encoding must not be empty".to_string()));
        }

        if self.workers == 0 {
            return Err(CompressError::Config("Number of workers must be greater than 0".to_string()));
        }

        if self.timeout_secs == Some(0) {
            return Err(CompressError::Config("Timeout must be greater than 0 seconds".to_string()));
        }

        Ok(())
    }

    /// Whether a file name denotes an already compressed file.
    ///
    /// The target suffix counts too, so outputs written under a custom suffix
    /// are never picked up as sources on the next run.
    pub fn is_compressed_name(&self, filename: &str) -> bool {
        PathUtil::is_already_compressed(filename, &self.compressed_suffixes)
            || (self.target_suffix.ends_with(&self.source_extension) && filename.ends_with(&self.target_suffix))
    }

    /// Whether a file name is a compression candidate
    pub fn is_candidate_name(&self, filename: &str) -> bool {
        filename.ends_with(&self.source_extension) && !self.is_compressed_name(filename)
    }

    /// Resolve relative paths against `base` (usually the project directory)
    pub fn resolve_against(mut self, base: &Path) -> Self {
        if self.root_dir.is_relative() {
            self.root_dir = base.join(&self.root_dir);
        }
        self.externs = self
            .externs
            .into_iter()
            .map(|p| if p.is_relative() { base.join(p) } else { p })
            .collect();
        self
    }

    /// Load configuration from file.
    ///
    /// Relative paths in the file are relative to the file's own directory.
    /// Not validated here: callers apply their overrides, then `validate`.
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: RunConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
        let base = path.parent().unwrap_or(Path::new(""));
        Ok(config.resolve_against(base))
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
