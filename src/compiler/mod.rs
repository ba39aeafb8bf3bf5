//! # Compiler Boundary
//!
//! The orchestrator only knows the `CompileInvoker` contract: compress one
//! source into one destination with a set of externs, report success and the
//! number of diagnostics. Compiler specific option assembly lives entirely in
//! the implementations:
//! - `closure`: drives the Closure Compiler as an external process
//! - `tool_resolver`: locates the compiler executable

pub mod closure;
pub mod tool_resolver;

pub use closure::{ClosureCompiler, CompilationLevel, CompilerSettings, LanguageMode, WarningLevel};
pub use tool_resolver::{CompilerCommand, ToolResolver};

use anyhow::Result;
use futures::future::BoxFuture;
use std::path::PathBuf;

/// One unit of work: compress `source` into `destination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub externs: Vec<PathBuf>,
    /// Charset of the source file
    pub encoding: String,
}

/// Result reported by a compiler for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOutcome {
    pub success: bool,
    pub error_count: usize,
}

impl CompileOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error_count: 0,
        }
    }

    pub fn failed(error_count: usize) -> Self {
        Self {
            success: false,
            error_count,
        }
    }
}

/// Compresses a single file.
///
/// Implementations must only write the destination on success. `Err` is for
/// failures to run the compiler at all; diagnostics in the input are reported
/// as `Ok(CompileOutcome::failed(n))`.
pub trait CompileInvoker: Send + Sync {
    fn compress<'a>(&'a self, task: &'a CompressionTask) -> BoxFuture<'a, Result<CompileOutcome>>;

    /// Whether `compress` may run concurrently on the same instance
    fn is_reentrant(&self) -> bool {
        false
    }
}
