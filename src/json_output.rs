//! # JSON Output Module
//!
//! Newline-delimited JSON events for build tools that drive `jscompress`
//! programmatically. Each event is a single line on stdout.
//!
//! ## Message types:
//! - `start`: run started, with candidate counts and the effective config
//! - `file_skipped`: output already up to date
//! - `file_complete`: a compression finished, successfully or not
//! - `complete`: run finished with final counts
//! - `error`: fatal error that aborted the run

use crate::config::RunConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JSON event
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "start")]
    Start {
        root_dir: PathBuf,
        candidates: usize,
        stale: usize,
        config: JsonConfig,
    },

    #[serde(rename = "file_skipped")]
    FileSkipped { source: PathBuf, destination: PathBuf },

    #[serde(rename = "file_complete")]
    FileComplete {
        source: PathBuf,
        destination: PathBuf,
        success: bool,
        error_count: Option<usize>,
        error: Option<String>,
    },

    #[serde(rename = "complete")]
    Complete {
        attempted: usize,
        succeeded: usize,
        failed: usize,
        skipped: usize,
        duration_seconds: f64,
    },

    #[serde(rename = "error")]
    Error { message: String },
}

/// Subset of the run configuration echoed in the `start` event
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonConfig {
    pub recursive: bool,
    pub force: bool,
    pub source_encoding: String,
    pub target_suffix: String,
    pub workers: usize,
    pub externs: Vec<PathBuf>,
}

impl JsonMessage {
    /// Write the message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(root_dir: PathBuf, candidates: usize, stale: usize, config: &RunConfig) -> Self {
        Self::Start {
            root_dir,
            candidates,
            stale,
            config: JsonConfig::from(config),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl From<&RunConfig> for JsonConfig {
    fn from(config: &RunConfig) -> Self {
        Self {
            recursive: config.recursive,
            force: config.force,
            source_encoding: config.source_encoding.clone(),
            target_suffix: config.target_suffix.clone(),
            workers: config.workers,
            externs: config.externs.clone(),
        }
    }
}
