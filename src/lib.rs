//! # JS Compress Library
//!
//! Keeps minified JavaScript artifacts in sync with their sources across
//! incremental builds.
//!
//! ## Modules:
//! - `config`: run configuration and validation
//! - `error`: error taxonomy
//! - `path_util`: output path derivation, compressed-name matching
//! - `staleness`: rebuild decision from modification times
//! - `scanner`: candidate discovery in a source tree
//! - `compiler`: the `CompileInvoker` boundary and the Closure Compiler invoker
//! - `orchestrator`: runs scan, staleness check and compilation per file
//! - `progress` / `json_output`: reporting
//!
//! ## Usage:
//! ```rust,no_run
//! use js_compress::compiler::{ClosureCompiler, CompilerSettings};
//! use js_compress::{Orchestrator, RunConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = RunConfig { root_dir: "web/js".into(), ..Default::default() };
//! let compiler = Arc::new(ClosureCompiler::new(CompilerSettings::default())?);
//! let result = Orchestrator::new(config, compiler).run().await?;
//! if result.has_failures() {
//!     anyhow::bail!("{}", result.format_summary());
//! }
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod json_output;
pub mod orchestrator;
pub mod path_util;
pub mod progress;
pub mod scanner;
pub mod staleness;

pub use compiler::{CompileInvoker, CompileOutcome, CompressionTask};
pub use config::RunConfig;
pub use error::CompressError;
pub use orchestrator::{FailedFile, Orchestrator, RunResult};
pub use path_util::PathUtil;
pub use scanner::{DirectoryScanner, SourceFile};
pub use staleness::StalenessPolicy;
