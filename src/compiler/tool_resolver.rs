//! # Compiler Path Resolver
//!
//! Finds the Closure Compiler in the different ways it gets installed:
//! - a jar run through `java -jar`
//! - an explicitly configured executable
//! - the `CLOSURE_COMPILER` environment variable
//! - the npm / package manager launchers on `PATH`

use crate::error::CompressError;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable that may point at the compiler executable
pub const COMPILER_ENV_VAR: &str = "CLOSURE_COMPILER";

/// Launcher names searched on `PATH`, in order
const COMPILER_NAMES: [&str; 2] = ["google-closure-compiler", "closure-compiler"];

/// A resolved program plus the arguments that precede the compiler flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
}

impl CompilerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// `java -jar <jar>`
    pub fn jar(java: impl Into<PathBuf>, jar: &Path) -> Self {
        Self::new(java).arg("-jar").arg(jar)
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.leading_args.push(arg.as_ref().to_os_string());
        self
    }
}

/// Resolves the compiler command
pub struct ToolResolver {
    search_path: Option<OsString>,
}

impl ToolResolver {
    /// Resolver over the process `PATH`
    pub fn new() -> Self {
        Self {
            search_path: env::var_os("PATH"),
        }
    }

    /// Resolver over an explicit search path
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }

    /// Resolve the compiler from the explicit settings, the environment, or `PATH`
    pub fn resolve(
        &self,
        compiler: Option<&Path>,
        compiler_jar: Option<&Path>,
        java: &Path,
    ) -> Result<CompilerCommand, CompressError> {
        if let Some(jar) = compiler_jar {
            if !jar.is_file() {
                return Err(CompressError::MissingDependency(format!(
                    "Compiler jar {} does not exist",
                    jar.display()
                )));
            }
            debug!("Using compiler jar: {}", jar.display());
            return Ok(CompilerCommand::jar(java, jar));
        }

        if let Some(program) = compiler {
            debug!("Using configured compiler: {}", program.display());
            return Ok(CompilerCommand::new(program));
        }

        if let Some(program) = env::var_os(COMPILER_ENV_VAR).filter(|v| !v.is_empty()) {
            debug!("Using compiler from {}: {:?}", COMPILER_ENV_VAR, program);
            return Ok(CompilerCommand::new(program));
        }

        COMPILER_NAMES
            .iter()
            .find_map(|name| self.find_in_search_path(name))
            .map(|path| {
                debug!("Using compiler from PATH: {}", path.display());
                CompilerCommand::new(path)
            })
            .ok_or_else(|| {
                CompressError::MissingDependency(format!(
                    "Closure Compiler not found. Install it with `npm install -g google-closure-compiler`, \
                     set {} or pass --compiler / --compiler-jar",
                    COMPILER_ENV_VAR
                ))
            })
    }

    /// Find an executable on the search path
    fn find_in_search_path(&self, tool_name: &str) -> Option<PathBuf> {
        let extensions: &[&str] = if cfg!(windows) { &[".cmd", ".exe", ""] } else { &[""] };

        env::split_paths(self.search_path.as_ref()?)
            .filter(|dir| !dir.as_os_str().is_empty())
            .flat_map(|dir| extensions.iter().map(move |ext| dir.join(format!("{}{}", tool_name, ext))))
            .find(|path| path.is_file())
    }
}

impl Default for ToolResolver {
    fn default() -> Self {
        Self::new()
    }
}
