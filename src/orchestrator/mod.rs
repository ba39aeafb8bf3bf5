//! # Orchestrator Module
//!
//! Split into:
//! - `run`: the `Orchestrator`, wiring scan -> staleness -> compile
//! - `task_runner`: per-file planning and compilation
//! - `result_tracker`: aggregation into `RunResult` plus reporting

pub mod result_tracker;
pub mod run;
pub mod task_runner;

pub use result_tracker::{FailedFile, ResultTracker, RunResult};
pub use run::Orchestrator;
pub use task_runner::{FileOutcome, FileStatus, TaskPlan, TaskRunner};
