//! # Result Tracking Module
//!
//! Aggregates per-file outcomes into a `RunResult` and mirrors them to the
//! log, the progress bar and (optionally) the JSON event stream. Outcomes
//! arrive one at a time from the orchestrator, so the tracker needs no locking.

use crate::{
    config::RunConfig,
    json_output::JsonMessage,
    orchestrator::task_runner::{FileOutcome, FileStatus},
    progress::ProgressManager,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

/// A file whose compression failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Diagnostics reported by the compiler, if it got that far
    pub error_count: Option<usize>,
    pub cause: String,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Candidates whose output was already up to date
    pub skipped: usize,
    pub failures: Vec<FailedFile>,
}

impl RunResult {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Compressed: {} | Failed: {} | Up to date: {} | Attempted: {}",
            self.succeeded, self.failed, self.skipped, self.attempted
        )
    }
}

/// Collects outcomes while a run is in progress
pub struct ResultTracker {
    json_output: bool,
    show_progress: bool,
    progress: ProgressManager,
    result: RunResult,
}

impl ResultTracker {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            json_output: config.json_output,
            show_progress: config.show_progress && !config.json_output,
            progress: ProgressManager::hidden(),
            result: RunResult::default(),
        }
    }

    /// Announce the run once the candidates are known
    pub fn start(&mut self, config: &RunConfig, root_dir: &Path, candidates: usize, stale: usize) {
        if self.json_output {
            JsonMessage::start(root_dir.to_path_buf(), candidates, stale, config).emit();
        } else {
            info!(
                "Found {} JS files in {}, {} need compressing",
                candidates,
                root_dir.display(),
                stale
            );
        }

        if self.show_progress && stale > 0 {
            self.progress = ProgressManager::new(stale as u64);
        }
    }

    pub fn record_skip(&mut self, source: &Path, destination: &Path) {
        self.result.skipped += 1;
        debug!("Ignoring already compressed JS file {}", source.display());

        if self.json_output {
            JsonMessage::FileSkipped {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
            }
            .emit();
        }
    }

    pub fn record(&mut self, outcome: FileOutcome) {
        let FileOutcome { task, status } = outcome;
        self.result.attempted += 1;

        let (error_count, error) = match status {
            FileStatus::Succeeded => {
                self.result.succeeded += 1;
                info!("✅ Compressed {} -> {}", task.source.display(), task.destination.display());
                (None, None)
            }
            FileStatus::Failed { error_count, cause } => {
                self.result.failed += 1;
                match error_count {
                    Some(count) => error!("Failed to compress JS with {} errors: {}", count, task.source.display()),
                    None => error!("Failed to compress JS {}: {}", task.source.display(), cause),
                }
                self.result.failures.push(FailedFile {
                    source: task.source.clone(),
                    destination: task.destination.clone(),
                    error_count,
                    cause: cause.clone(),
                });
                (error_count, Some(cause))
            }
        };

        self.progress
            .update(&task.source.file_name().unwrap_or_default().to_string_lossy());

        if self.json_output {
            JsonMessage::FileComplete {
                success: error.is_none(),
                source: task.source,
                destination: task.destination,
                error_count,
                error,
            }
            .emit();
        }
    }

    /// Close the progress bar and hand back the aggregate
    pub fn finish(self, elapsed: Duration) -> RunResult {
        let summary = self.result.format_summary();
        self.progress.finish(&summary);

        if self.json_output {
            JsonMessage::Complete {
                attempted: self.result.attempted,
                succeeded: self.result.succeeded,
                failed: self.result.failed,
                skipped: self.result.skipped,
                duration_seconds: elapsed.as_secs_f64(),
            }
            .emit();
        } else {
            info!("📊 {} in {:.2}s", summary, elapsed.as_secs_f64());
        }

        self.result
    }
}
