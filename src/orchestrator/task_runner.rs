//! # Task Runner Module
//!
//! Per-file worker: decides whether a candidate is stale and, if so, runs
//! the compiler on it. Every failure stops at this boundary and comes back
//! as a `FileStatus::Failed` value.

use crate::{
    compiler::{CompileInvoker, CompressionTask},
    config::RunConfig,
    error::CompressError,
    path_util::PathUtil,
    scanner::SourceFile,
    staleness::StalenessPolicy,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// What to do with a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPlan {
    UpToDate { source: PathBuf, destination: PathBuf },
    Stale(CompressionTask),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Succeeded,
    Failed { error_count: Option<usize>, cause: String },
}

/// Outcome of one compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub task: CompressionTask,
    pub status: FileStatus,
}

pub struct TaskRunner<'a> {
    config: &'a RunConfig,
    invoker: &'a dyn CompileInvoker,
}

impl<'a> TaskRunner<'a> {
    pub fn new(config: &'a RunConfig, invoker: &'a dyn CompileInvoker) -> Self {
        Self { config, invoker }
    }

    /// Derive the destination and check it against the source
    pub fn plan(&self, candidate: &SourceFile) -> TaskPlan {
        let destination = PathUtil::derive_destination(&candidate.path, &self.config.target_suffix);
        let dest_modified = StalenessPolicy::modification_time(&destination);

        if !StalenessPolicy::needs_rebuild(candidate.modified, dest_modified, self.config.force) {
            return TaskPlan::UpToDate {
                source: candidate.path.clone(),
                destination,
            };
        }

        TaskPlan::Stale(CompressionTask {
            source: candidate.path.clone(),
            destination,
            externs: self.config.externs.clone(),
            encoding: self.config.source_encoding.clone(),
        })
    }

    /// Run the compiler on one task
    pub async fn execute(&self, task: CompressionTask) -> FileOutcome {
        debug!(
            "Start {}compressing JS file {}",
            if self.config.force { "forced " } else { "" },
            task.source.display()
        );

        let compress = self.invoker.compress(&task);
        let result = match self.config.timeout_secs {
            Some(seconds) => match tokio::time::timeout(Duration::from_secs(seconds), compress).await {
                Ok(result) => result,
                Err(_) => Err(CompressError::Timeout {
                    path: task.source.clone(),
                    seconds,
                }
                .into()),
            },
            None => compress.await,
        };

        let status = match result {
            Ok(outcome) if outcome.success => FileStatus::Succeeded,
            Ok(outcome) => FileStatus::Failed {
                error_count: Some(outcome.error_count),
                cause: format!("{} errors reported by the compiler", outcome.error_count),
            },
            Err(e) => FileStatus::Failed {
                error_count: None,
                cause: format!("{:#}", e),
            },
        };

        FileOutcome { task, status }
    }
}
