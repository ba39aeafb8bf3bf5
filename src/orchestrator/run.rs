//! # Orchestrator
//!
//! Drives one run over a source tree.
//!
//! ## Flow:
//! 1. **Validation**: config and root directory; failures here abort the run
//! 2. **Discovery**: `DirectoryScanner` collects candidates
//! 3. **Planning**: each candidate is checked against its destination
//! 4. **Compression**: stale files go to the `CompileInvoker`, at most
//!    `workers` at a time (one for invokers that are not reentrant)
//! 5. **Reporting**: outcomes are aggregated into a `RunResult`
//!
//! A failing file never stops the run. Whether failures should fail the
//! surrounding build is up to the caller, by inspecting the `RunResult`.
//!
//! ## Example:
//! ```rust,no_run
//! use js_compress::compiler::{ClosureCompiler, CompilerSettings};
//! use js_compress::{Orchestrator, RunConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let compiler = ClosureCompiler::new(CompilerSettings::default())?;
//! let orchestrator = Orchestrator::new(RunConfig::default(), Arc::new(compiler));
//! let result = orchestrator.run().await?;
//! println!("{}", result.format_summary());
//! # Ok(())
//! # }
//! ```

use crate::{
    compiler::CompileInvoker,
    config::RunConfig,
    error::CompressError,
    orchestrator::{
        result_tracker::{ResultTracker, RunResult},
        task_runner::{TaskPlan, TaskRunner},
    },
    scanner::DirectoryScanner,
};
use futures::stream::{self, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Main compression orchestrator
pub struct Orchestrator {
    config: RunConfig,
    invoker: Arc<dyn CompileInvoker>,
}

impl Orchestrator {
    pub fn new(config: RunConfig, invoker: Arc<dyn CompileInvoker>) -> Self {
        Self { config, invoker }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Compress every stale JS file below the root directory
    pub async fn run(&self) -> Result<RunResult, CompressError> {
        let start_time = Instant::now();

        self.config.validate()?;
        let root_dir = self.validate_root_dir()?;
        self.log_configuration(&root_dir);

        let candidates = DirectoryScanner::new(&self.config).scan(&root_dir, self.config.recursive);
        let runner = TaskRunner::new(&self.config, self.invoker.as_ref());

        let mut up_to_date = Vec::new();
        let mut tasks = Vec::new();
        for candidate in &candidates {
            match runner.plan(candidate) {
                TaskPlan::UpToDate { source, destination } => up_to_date.push((source, destination)),
                TaskPlan::Stale(task) => tasks.push(task),
            }
        }

        let mut tracker = ResultTracker::new(&self.config);
        tracker.start(&self.config, &root_dir, candidates.len(), tasks.len());
        for (source, destination) in &up_to_date {
            tracker.record_skip(source, destination);
        }

        let mut outcomes = stream::iter(tasks)
            .map(|task| runner.execute(task))
            .buffer_unordered(self.effective_workers());
        while let Some(outcome) = outcomes.next().await {
            tracker.record(outcome);
        }

        Ok(tracker.finish(start_time.elapsed()))
    }

    /// The root directory must exist, be reachable and be a directory
    fn validate_root_dir(&self) -> Result<PathBuf, CompressError> {
        let root_dir = &self.config.root_dir;
        let canonical = root_dir.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                CompressError::Config(format!("JS source directory '{}' does not exist", root_dir.display()))
            }
            _ => CompressError::Config(format!(
                "JS source directory '{}' is not accessible: {}",
                root_dir.display(),
                e
            )),
        })?;
        if !canonical.is_dir() {
            return Err(CompressError::Config(format!(
                "JS source path '{}' is not a directory",
                root_dir.display()
            )));
        }
        Ok(canonical)
    }

    fn effective_workers(&self) -> usize {
        if self.invoker.is_reentrant() {
            return self.config.workers;
        }
        if self.config.workers > 1 {
            warn!(
                "Compiler cannot run concurrently, ignoring workers = {}",
                self.config.workers
            );
        }
        1
    }

    fn log_configuration(&self, root_dir: &Path) {
        if self.config.json_output {
            return;
        }

        info!("🔧 Compressing JS files in: {}", root_dir.display());
        info!(
            "Mode: {}{}, target suffix '{}', encoding {}",
            if self.config.recursive { "recursive" } else { "top level only" },
            if self.config.force { ", forced" } else { "" },
            self.config.target_suffix,
            self.config.source_encoding
        );
        if !self.config.externs.is_empty() {
            info!("Externs: {} files", self.config.externs.len());
        }
    }
}
