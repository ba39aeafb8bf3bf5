//! # Error Types Module
//!
//! Error taxonomy for a compression run.
//!
//! ## Categories:
//! - `Config`: invalid run configuration (missing root directory, bad suffix, ...).
//!   Fatal: the run aborts before any file is processed.
//! - `Io`: filesystem errors outside the per-file boundary
//! - `MissingDependency`: the external compiler cannot be resolved
//! - `Compiler`: the external compiler could not be started or misbehaved
//! - `Timeout`: a single file exceeded the configured time budget
//!
//! Per-file failures never surface as `Err` from `Orchestrator::run`; they are
//! recorded in the `RunResult` instead.
//!
//! ## Example:
//! ```rust
//! use js_compress::CompressError;
//!
//! let err = CompressError::Config("root directory does not exist".to_string());
//! assert!(err.is_fatal());
//! ```

use std::path::PathBuf;

/// Custom error types for JS compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Compiler error: {0}")]
    Compiler(String),

    #[error("Compression of {} timed out after {seconds}s", path.display())]
    Timeout { path: PathBuf, seconds: u64 },
}

impl CompressError {
    /// Whether this error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::MissingDependency(_))
    }
}
